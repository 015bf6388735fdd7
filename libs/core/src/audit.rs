//! Audit records of manual schedule edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Period, ShiftCode, ShiftTransition};

/// One manual edit of one cell. Never modified after creation.
///
/// Field names match the persisted audit documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Worker whose cell changed.
    #[serde(rename = "persona")]
    pub worker: String,

    /// 1-based day of month.
    #[serde(rename = "dia")]
    pub day: u32,

    #[serde(rename = "turnoAnterior", deserialize_with = "lenient_code")]
    pub previous: ShiftCode,

    #[serde(rename = "turnoNuevo", deserialize_with = "lenient_code")]
    pub next: ShiftCode,

    /// When the edit was made.
    #[serde(rename = "fecha")]
    pub at: DateTime<Utc>,

    /// Schedule the edit belongs to. Absent on records written before
    /// records were tagged.
    #[serde(rename = "periodo", default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

impl ChangeRecord {
    pub fn from_transition(transition: &ShiftTransition, period: Period, at: DateTime<Utc>) -> Self {
        Self {
            worker: transition.worker.clone(),
            day: transition.day,
            previous: transition.previous,
            next: transition.next,
            at,
            period: Some(period),
        }
    }

    /// Whether the record should appear in the history of `period`.
    pub fn belongs_to(&self, period: Period) -> bool {
        self.period.is_none_or(|p| p == period)
    }

    pub fn to_document(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(serde::ser::Error::custom("change record is not an object")),
        }
    }

    pub fn from_document(document: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(document.clone()))
    }
}

fn lenient_code<'de, D>(deserializer: D) -> Result<ShiftCode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(ShiftCode::from_stored(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> ChangeRecord {
        ChangeRecord {
            worker: "Tato".to_string(),
            day: 1,
            previous: ShiftCode::Night,
            next: ShiftCode::Morning,
            at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
            period: Some(Period::new(2025, 6).unwrap()),
        }
    }

    #[test]
    fn test_document_shape() {
        let doc = sample().to_document().unwrap();
        assert_eq!(doc["persona"], json!("Tato"));
        assert_eq!(doc["dia"], json!(1));
        assert_eq!(doc["turnoAnterior"], json!("N"));
        assert_eq!(doc["turnoNuevo"], json!("M"));
        assert_eq!(doc["fecha"], json!("2025-06-01T09:30:00Z"));
        assert_eq!(doc["periodo"], json!("2025-6"));
    }

    #[test]
    fn test_untagged_record() {
        let doc = json!({
            "persona": "Diana",
            "dia": 3,
            "turnoAnterior": "??",
            "turnoNuevo": "C",
            "fecha": "2025-06-03T10:00:00Z",
        });
        let record = ChangeRecord::from_document(doc.as_object().unwrap()).unwrap();
        assert_eq!(record.previous, ShiftCode::Off);
        assert_eq!(record.next, ShiftCode::Day);
        assert_eq!(record.period, None);
        assert!(record.belongs_to(Period::new(2030, 1).unwrap()));
    }

    #[test]
    fn test_belongs_to() {
        let record = sample();
        assert!(record.belongs_to(Period::new(2025, 6).unwrap()));
        assert!(!record.belongs_to(Period::new(2025, 7).unwrap()));
    }

    #[test]
    fn test_malformed_document() {
        let doc = json!({ "persona": "Diana" });
        assert!(ChangeRecord::from_document(doc.as_object().unwrap()).is_err());
    }
}
