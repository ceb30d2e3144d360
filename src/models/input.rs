use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

/// One normalized participant row as handed over by the ingestion step.
///
/// The category answers are kept as raw strings; `Person::from_row` coerces
/// them. Every field not named here that holds a number is treated as a trait
/// score.
///
/// ```json
/// {
///   "studentId": "u2100001",
///   "name": "Alex",
///   "identity": "Woman",
///   "seeking": "Men",
///   "day": "Thursday, 21st Nov",
///   "year": "2nd Year",
///   "yearPreference": "Open to any year",
///   "I like to travel.": 0.75
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ParticipantRow {
    #[validate(length(min = 1))]
    #[serde(alias = "id", alias = "student_id", rename = "studentId")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "gender")]
    pub identity: String,
    #[serde(default, alias = "interestedIn")]
    pub seeking: String,
    #[serde(default, alias = "preferredDay")]
    pub day: String,
    #[serde(default, alias = "yearOfStudy")]
    pub year: String,
    #[serde(default, alias = "year_preference", rename = "yearPreference")]
    pub year_preference: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ParticipantRow {
    /// Numeric extra fields, in key order
    pub fn numeric_fields(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.extra
            .iter()
            .filter_map(|(key, value)| value.as_f64().map(|v| (key.as_str(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fields_become_traits() {
        let row: ParticipantRow = serde_json::from_value(serde_json::json!({
            "studentId": "u1",
            "name": "Alex",
            "identity": "Woman",
            "seeking": "Men",
            "day": "Either",
            "year": "1st Year",
            "yearPreference": "Open to any year",
            "adventurous": 0.8,
            "serious": 1,
            "favourite colour": "green"
        }))
        .unwrap();

        let traits: Vec<_> = row.numeric_fields().collect();
        assert_eq!(traits, vec![("adventurous", 0.8), ("serious", 1.0)]);
    }

    #[test]
    fn test_missing_categories_default_to_empty() {
        let row: ParticipantRow = serde_json::from_value(serde_json::json!({
            "studentId": "u2"
        }))
        .unwrap();

        assert!(row.identity.is_empty());
        assert!(row.validate().is_ok());
    }

    #[test]
    fn test_empty_id_rejected() {
        let row: ParticipantRow = serde_json::from_value(serde_json::json!({
            "studentId": ""
        }))
        .unwrap();

        assert!(row.validate().is_err());
    }
}
