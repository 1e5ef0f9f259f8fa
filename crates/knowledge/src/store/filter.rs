//! Equality filters over the indexed metadata columns.

use ragbot_core::{AppError, AppResult};

/// Metadata keys stored as their own columns and therefore filterable.
pub const FILTERABLE_FIELDS: [&str; 2] = ["source", "file_path"];

/// Conjunction of `field = value` conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: Vec<(String, String)>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition. Only [`FILTERABLE_FIELDS`] are accepted.
    pub fn eq(mut self, field: &str, value: impl Into<String>) -> AppResult<Self> {
        if !FILTERABLE_FIELDS.contains(&field) {
            return Err(AppError::Knowledge(format!(
                "Cannot filter on metadata field '{}'. Filterable fields: {}",
                field,
                FILTERABLE_FIELDS.join(", ")
            )));
        }
        self.conditions.push((field.to_string(), value.into()));
        Ok(self)
    }

    /// Shorthand for a single `source = name` condition.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            conditions: vec![("source".to_string(), name.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// SQL predicate for the query builder; `None` when there are no conditions.
    pub fn to_predicate(&self) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }

        let predicate = self
            .conditions
            .iter()
            .map(|(field, value)| format!("{} = '{}'", field, value.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(" AND ");

        Some(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_joins_conditions() {
        let filter = MetadataFilter::new()
            .eq("source", "report.pdf")
            .unwrap()
            .eq("file_path", "uploads/report.pdf")
            .unwrap();

        assert_eq!(
            filter.to_predicate().as_deref(),
            Some("source = 'report.pdf' AND file_path = 'uploads/report.pdf'")
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let filter = MetadataFilter::source("o'brien.txt");
        assert_eq!(
            filter.to_predicate().as_deref(),
            Some("source = 'o''brien.txt'")
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = MetadataFilter::new().eq("author", "someone").unwrap_err();
        assert!(matches!(err, AppError::Knowledge(_)));
    }

    #[test]
    fn test_empty_filter_has_no_predicate() {
        assert!(MetadataFilter::new().to_predicate().is_none());
    }
}
