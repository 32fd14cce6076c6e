//! Picking the source a run updates

use sourcegen_dbt::{Source, SourceDocument};

/// Result of splitting a document's sources into the target and the rest
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSelection<'a> {
    /// The source to merge into, if the document has one
    pub selected: Option<&'a Source>,

    /// Every other source, in document order
    pub others: Vec<&'a Source>,

    /// Names of sources that also matched but lost to an earlier one
    pub ambiguous: Vec<&'a str>,
}

impl SourceSelection<'_> {
    pub fn is_ambiguous(&self) -> bool {
        !self.ambiguous.is_empty()
    }
}

/// Find the source named `source_name` or pointing at `dataset_id`
///
/// The first match in document order wins. Later matches stay in `others`
/// untouched and are listed in `ambiguous`.
pub fn select_source<'a>(
    sources: &'a [Source],
    source_name: &str,
    dataset_id: &str,
) -> SourceSelection<'a> {
    let mut selection = SourceSelection {
        selected: None,
        others: Vec::with_capacity(sources.len()),
        ambiguous: Vec::new(),
    };

    for source in sources {
        let matches = source.name == source_name
            || source.schema_name.as_deref() == Some(dataset_id);

        if matches && selection.selected.is_none() {
            selection.selected = Some(source);
            continue;
        }
        if matches {
            selection.ambiguous.push(source.name.as_str());
        }
        selection.others.push(source);
    }

    selection
}

/// Decide which source name a run should use
///
/// An explicit name wins. Otherwise the first existing source that points at
/// the dataset (by schema or by name) keeps its name, and a brand new source
/// is named after the dataset.
pub fn resolve_source_name(
    existing: Option<&SourceDocument>,
    dataset_id: &str,
    requested: Option<&str>,
) -> String {
    if let Some(requested) = requested {
        return requested.to_string();
    }

    existing
        .into_iter()
        .flat_map(|doc| doc.sources.iter())
        .find(|s| s.schema_name.as_deref() == Some(dataset_id) || s.name == dataset_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| dataset_id.to_string())
}
