use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub const ADVISOR_CONSULTATION: &str = "advisor";

/// One persisted advisor consultation. Missing fields read back as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsultationRecord {
    pub timestamp: String,
    pub consultation_type: String,
    pub advisor: String,
    pub advisor_icon: String,
    pub advisor_name: String,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub score_at_time: f64,
    pub consultation_mode: String,
    pub mode_icon: String,
    pub mode_frequency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_guidance: Option<String>,
    pub quote: String,
    pub quote_source: String,
    pub encouragement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_mode: Option<String>,
}

impl ConsultationRecord {
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted() {
        let record = ConsultationRecord {
            timestamp: "2024-01-02T10:00:00+00:00".to_string(),
            consultation_type: ADVISOR_CONSULTATION.to_string(),
            metric: Some("security".to_string()),
            ..ConsultationRecord::default()
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["metric"], "security");
        assert!(value.get("tool").is_none());
        assert!(value.get("context").is_none());
        assert_eq!(value["score_at_time"], 0.0);
    }

    #[test]
    fn sparse_lines_read_with_defaults() {
        let record: ConsultationRecord =
            serde_json::from_str(r#"{"timestamp":"2024-01-02T10:00:00Z","advisor":"bofh"}"#)
                .expect("deserialize");
        assert_eq!(record.advisor, "bofh");
        assert!(record.quote.is_empty());
        assert!(record.parsed_timestamp().is_some());

        let undated = ConsultationRecord::default();
        assert!(undated.parsed_timestamp().is_none());
    }
}
