//! Document store filter construction
//!
//! A [`DocFilter`] maps dot-delimited field paths to match conditions and
//! serializes to the MongoDB-style JSON the metadata API expects:
//!
//! ```json
//! {
//!   "data_description.project_name": {"$in": ["Ephys Platform"]},
//!   "subject.subject_id": "123456"
//! }
//! ```

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

/// Field path of the project name
pub const PROJECT_NAME_FIELD: &str = "data_description.project_name";

/// Field path of the subject id
pub const SUBJECT_ID_FIELD: &str = "subject.subject_id";

/// Fields returned for each record
pub const PROJECTION: [&str; 3] = ["name", SUBJECT_ID_FIELD, PROJECT_NAME_FIELD];

/// Maximum number of records fetched per query
pub const RESULT_LIMIT: usize = 10;

/// Match condition for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field equals the value
    Equals(String),
    /// Field equals any of the values
    AnyOf(Vec<String>),
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Condition::Equals(value) => serializer.serialize_str(value),
            Condition::AnyOf(values) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$in", values)?;
                map.end()
            },
        }
    }
}

/// Field path to condition mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DocFilter {
    conditions: BTreeMap<String, Condition>,
}

impl DocFilter {
    /// Empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the condition for `field`
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    /// True when no condition is set; such a filter must not be sent
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Condition for `field`, if any
    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions.get(field)
    }

    /// Filter as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Build the record filter from the search widgets
///
/// Project names are deduplicated in first-seen order; blank entries are
/// ignored. The subject id is trimmed. When both inputs are empty the
/// filter is empty and no query should be issued.
pub fn build_filter<S: AsRef<str>>(project_names: &[S], subject_id: &str) -> DocFilter {
    let mut projects: Vec<String> = Vec::with_capacity(project_names.len());
    for name in project_names {
        let name = name.as_ref();
        if !name.trim().is_empty() && !projects.iter().any(|p| p == name) {
            projects.push(name.to_string());
        }
    }

    let mut filter = DocFilter::new();
    if !projects.is_empty() {
        filter = filter.with(PROJECT_NAME_FIELD, Condition::AnyOf(projects));
    }

    let subject_id = subject_id.trim();
    if !subject_id.is_empty() {
        filter = filter.with(SUBJECT_ID_FIELD, Condition::Equals(subject_id.to_string()));
    }

    filter
}

/// Projection document, e.g. `{"name": 1, ...}`
pub fn projection_json(fields: &[&str]) -> serde_json::Value {
    let fields: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|f| (f.to_string(), serde_json::Value::from(1)))
        .collect();
    serde_json::Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_inputs_build_empty_filter() {
        let filter = build_filter::<&str>(&[], "");
        assert!(filter.is_empty());
        assert_eq!(filter.to_json(), json!({}));
    }

    #[test]
    fn test_both_conditions() {
        let filter = build_filter(&["P1", "P2"], "S1");
        assert_eq!(filter.len(), 2);
        assert_eq!(
            filter.get(PROJECT_NAME_FIELD),
            Some(&Condition::AnyOf(vec!["P1".to_string(), "P2".to_string()]))
        );
        assert_eq!(
            filter.get(SUBJECT_ID_FIELD),
            Some(&Condition::Equals("S1".to_string()))
        );
        assert_eq!(
            filter.to_json(),
            json!({
                "data_description.project_name": {"$in": ["P1", "P2"]},
                "subject.subject_id": "S1"
            })
        );
    }

    #[test]
    fn test_subject_only() {
        let filter = build_filter::<&str>(&[], "  632269 ");
        assert_eq!(filter.to_json(), json!({"subject.subject_id": "632269"}));
    }

    #[test]
    fn test_whitespace_only_criteria_are_dropped() {
        let filter = build_filter(&["  ", "\t"], "   ");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_projects_deduplicated() {
        let filter = build_filter(&["Ephys Platform", "", "Ephys Platform"], "");
        assert_eq!(
            filter.get(PROJECT_NAME_FIELD),
            Some(&Condition::AnyOf(vec!["Ephys Platform".to_string()]))
        );
    }

    #[test]
    fn test_projection() {
        assert_eq!(
            projection_json(&PROJECTION),
            json!({"name": 1, "subject.subject_id": 1, "data_description.project_name": 1})
        );
    }
}
