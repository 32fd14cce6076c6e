//! Table name filtering (`--table-pattern` / `--exclude`)

use regex::Regex;

/// Selects which warehouse tables take part in a run
///
/// A table is kept when it matches the glob pattern (if any) and does not
/// contain the exclude substring (if any). Globs support `*` (any run of
/// characters) and `?` (exactly one character) and must match the whole name.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    pattern: Option<String>,
    matcher: Option<Regex>,
    exclude: Option<String>,
}

impl TableFilter {
    /// A filter that keeps every table
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from optional CLI values
    pub fn new(pattern: Option<&str>, exclude: Option<&str>) -> Result<Self, regex::Error> {
        let mut filter = Self::all();
        if let Some(pattern) = pattern {
            filter = filter.with_pattern(pattern)?;
        }
        if let Some(exclude) = exclude {
            filter = filter.with_exclude(exclude);
        }
        Ok(filter)
    }

    /// Only keep tables whose name matches `pattern`
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.matcher = Some(Regex::new(&glob_to_regex(pattern))?);
        self.pattern = Some(pattern.to_string());
        Ok(self)
    }

    /// Drop tables whose name contains `needle`
    pub fn with_exclude(mut self, needle: &str) -> Self {
        // An empty needle would exclude everything
        self.exclude = (!needle.is_empty()).then(|| needle.to_string());
        self
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn exclude(&self) -> Option<&str> {
        self.exclude.as_deref()
    }

    /// Check whether a table name passes the filter
    pub fn matches(&self, table_name: &str) -> bool {
        if let Some(matcher) = &self.matcher {
            if !matcher.is_match(table_name) {
                return false;
            }
        }

        match &self.exclude {
            Some(needle) => !table_name.contains(needle.as_str()),
            None => true,
        }
    }
}

/// Translate a `*`/`?` glob into an anchored regex
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out.push('$');
    out
}
