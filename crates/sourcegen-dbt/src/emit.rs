//! Block-style YAML writer with configurable indentation
//!
//! `serde_yaml` always writes sequences flush with their parent key. dbt
//! projects conventionally indent them (`sources:` / `  - name: raw`), so the
//! document is converted to a `serde_yaml::Value` and laid out here instead.
//! Scalars are still quoted by `serde_yaml` so they read back as the same type.

use serde_yaml::{Mapping, Value};
use sourcegen_core::{FormatConfig, QuoteStyle};

/// Error for values that have no block representation here
#[derive(Debug, thiserror::Error)]
pub(crate) enum EmitError {
    #[error("unsupported mapping key: {0}")]
    UnsupportedKey(String),

    #[error("failed to quote scalar: {0}")]
    Scalar(String),
}

pub(crate) struct Emitter<'a> {
    format: &'a FormatConfig,
    out: String,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(format: &'a FormatConfig) -> Self {
        Self {
            format,
            out: String::new(),
        }
    }

    /// Render a top-level value
    pub(crate) fn emit(mut self, value: &Value) -> Result<String, EmitError> {
        match value {
            Value::Mapping(map) if !map.is_empty() => self.write_mapping(map, 0, false)?,
            Value::Sequence(seq) if !seq.is_empty() => self.write_sequence(seq, 0)?,
            scalar => {
                let text = self.scalar(scalar)?;
                self.out.push_str(&text);
                self.out.push('\n');
            }
        }
        Ok(self.out)
    }

    fn pad(&mut self, width: usize) {
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    /// Write `key: value` lines at `indent`
    ///
    /// With `first_inline` the first key continues the current line, which is
    /// how a mapping starts right after a sequence dash.
    fn write_mapping(
        &mut self,
        map: &Mapping,
        indent: usize,
        first_inline: bool,
    ) -> Result<(), EmitError> {
        for (i, (key, value)) in map.iter().enumerate() {
            if !(first_inline && i == 0) {
                self.pad(indent);
            }
            let key = self.key(key)?;
            self.out.push_str(&key);
            self.out.push(':');
            self.write_node(
                value,
                indent + self.format.indent,
                indent + self.format.sequence_offset,
            )?;
        }
        Ok(())
    }

    fn write_sequence(&mut self, seq: &[Value], dash_indent: usize) -> Result<(), EmitError> {
        // Content after "- " starts two columns right of the dash
        let item_indent = dash_indent + 2;
        for item in seq {
            self.pad(dash_indent);
            self.out.push('-');
            match item {
                Value::Mapping(map) if !map.is_empty() => {
                    self.out.push(' ');
                    self.write_mapping(map, item_indent, true)?;
                }
                other => self.write_node(other, item_indent, item_indent)?,
            }
        }
        Ok(())
    }

    /// Write whatever follows a `key:` or `-` marker, including the newline
    fn write_node(
        &mut self,
        value: &Value,
        mapping_indent: usize,
        sequence_indent: usize,
    ) -> Result<(), EmitError> {
        match value {
            Value::Mapping(map) if !map.is_empty() => {
                self.out.push('\n');
                self.write_mapping(map, mapping_indent, false)
            }
            Value::Sequence(seq) if !seq.is_empty() => {
                self.out.push('\n');
                self.write_sequence(seq, sequence_indent)
            }
            Value::Tagged(tagged) => {
                self.out.push(' ');
                self.out.push_str(&tagged.tag.to_string());
                self.write_node(&tagged.value, mapping_indent, sequence_indent)
            }
            scalar => {
                let text = self.scalar(scalar)?;
                self.out.push(' ');
                self.out.push_str(&text);
                self.out.push('\n');
                Ok(())
            }
        }
    }

    fn key(&self, key: &Value) -> Result<String, EmitError> {
        match key {
            // Keys keep minimal quoting whatever the value style
            Value::String(s) => minimal(s),
            Value::Number(_) | Value::Bool(_) | Value::Null => self.scalar(key),
            other => Err(EmitError::UnsupportedKey(format!("{other:?}"))),
        }
    }

    fn scalar(&self, value: &Value) -> Result<String, EmitError> {
        match value {
            Value::Null => Ok("null".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => self.string(s),
            Value::Mapping(_) => Ok("{}".to_string()),
            Value::Sequence(_) => Ok("[]".to_string()),
            Value::Tagged(tagged) => Ok(format!("{} {}", tagged.tag, self.scalar(&tagged.value)?)),
        }
    }

    fn string(&self, s: &str) -> Result<String, EmitError> {
        match self.format.quote_style {
            QuoteStyle::Double => double_quoted(s),
            QuoteStyle::Minimal => minimal(s),
        }
    }
}

fn minimal(s: &str) -> Result<String, EmitError> {
    if s.contains('\n') {
        return double_quoted(s);
    }

    let rendered = serde_yaml::to_string(s).map_err(|e| EmitError::Scalar(e.to_string()))?;
    let rendered = rendered.trim_end_matches('\n');
    if rendered.contains('\n') {
        // Block scalars would need their own indentation handling
        return double_quoted(s);
    }
    Ok(rendered.to_string())
}

/// JSON string syntax is a valid YAML double-quoted scalar
fn double_quoted(s: &str) -> Result<String, EmitError> {
    serde_json::to_string(s).map_err(|e| EmitError::Scalar(e.to_string()))
}
