//! Tool argument coercion.
//!
//! Raw `arguments` maps are converted once into a validated struct per tool.
//! Numbers are accepted as JSON integers or floats alike.

use devwisdom_core::{clamp_score, SelectorKind};
use devwisdom_log::MAX_READ_DAYS;
use serde_json::{Map, Value};

use crate::error::ToolError;

pub const DEFAULT_CONSULT_SCORE: f64 = 0.0;
pub const DEFAULT_BRIEFING_SCORE: f64 = 50.0;
pub const DEFAULT_LOG_DAYS: u32 = 7;

pub type Arguments = Map<String, Value>;

pub fn arguments_object(arguments: Option<&Value>) -> Result<Arguments, ToolError> {
    match arguments {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(ToolError::invalid_params("tool arguments must be an object")),
    }
}

/// Reads an optional numeric field. `null` counts as absent.
pub fn number_field(args: &Arguments, name: &str) -> Result<Option<f64>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ToolError::invalid_params(format!("{name} must be a finite number"))),
        Some(other) => Err(ToolError::invalid_params(format!(
            "{name} must be a number, got {}",
            json_type(other)
        ))),
    }
}

/// Reads an optional string field. Blank strings count as absent.
pub fn string_field(args: &Arguments, name: &str) -> Result<Option<String>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ToolError::invalid_params(format!(
            "{name} must be a string, got {}",
            json_type(other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetWisdomArgs {
    pub score: f64,
    pub source: Option<String>,
}

impl GetWisdomArgs {
    pub fn parse(arguments: Option<&Value>) -> Result<Self, ToolError> {
        let args = arguments_object(arguments)?;
        let score = number_field(&args, "score")?.ok_or_else(|| {
            ToolError::invalid_params("score is required and must be a number between 0 and 100")
        })?;
        Ok(Self {
            score: clamp_score(score),
            source: string_field(&args, "source")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsultAdvisorArgs {
    /// The first selector present, in metric, tool, stage order.
    pub selector: Option<(SelectorKind, String)>,
    pub score: f64,
    pub context: Option<String>,
}

impl ConsultAdvisorArgs {
    pub fn parse(arguments: Option<&Value>) -> Result<Self, ToolError> {
        let args = arguments_object(arguments)?;
        let mut selector = None;
        for kind in SelectorKind::PRIORITY {
            if let Some(key) = string_field(&args, kind.as_str())? {
                if selector.is_none() {
                    selector = Some((kind, key));
                }
            }
        }
        Ok(Self {
            selector,
            score: clamp_score(number_field(&args, "score")?.unwrap_or(DEFAULT_CONSULT_SCORE)),
            context: string_field(&args, "context")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyBriefingArgs {
    pub score: f64,
}

impl DailyBriefingArgs {
    pub fn parse(arguments: Option<&Value>) -> Result<Self, ToolError> {
        let args = arguments_object(arguments)?;
        Ok(Self {
            score: clamp_score(number_field(&args, "score")?.unwrap_or(DEFAULT_BRIEFING_SCORE)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsultationLogArgs {
    pub days: u32,
}

impl ConsultationLogArgs {
    pub fn parse(arguments: Option<&Value>) -> Result<Self, ToolError> {
        let args = arguments_object(arguments)?;
        let days = number_field(&args, "days")?.map_or(DEFAULT_LOG_DAYS, days_from_number);
        Ok(Self { days })
    }
}

/// Truncates toward zero; negative values read as 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn days_from_number(days: f64) -> u32 {
    if days.is_nan() || days <= 0.0 {
        return 0;
    }
    days.trunc().min(f64::from(MAX_READ_DAYS)) as u32
}

/// Integer day counts: negative values read as 0.
pub fn days_from_integer(days: i64) -> u32 {
    u32::try_from(days.clamp(0, i64::from(MAX_READ_DAYS))).unwrap_or(MAX_READ_DAYS)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn integers_and_floats_coerce_identically() {
        let int = GetWisdomArgs::parse(Some(&json!({"score": 75}))).expect("int");
        let float = GetWisdomArgs::parse(Some(&json!({"score": 75.0}))).expect("float");
        assert_eq!(int, float);
    }

    #[test]
    fn get_wisdom_requires_numeric_score() {
        let missing = GetWisdomArgs::parse(Some(&json!({"source": "stoic"})));
        assert!(matches!(missing, Err(ToolError::InvalidParams { .. })));
        let text = GetWisdomArgs::parse(Some(&json!({"score": "high"})));
        assert!(matches!(text, Err(ToolError::InvalidParams { .. })));
        assert!(GetWisdomArgs::parse(None).is_err());
    }

    #[test]
    fn scores_are_clamped() {
        let low = GetWisdomArgs::parse(Some(&json!({"score": -10}))).expect("low");
        assert_eq!(low.score, 0.0);
        let high = DailyBriefingArgs::parse(Some(&json!({"score": 150.5}))).expect("high");
        assert_eq!(high.score, 100.0);
        assert_eq!(DailyBriefingArgs::parse(None).expect("default").score, 50.0);
    }

    #[test]
    fn consult_advisor_honors_first_selector() {
        let args = ConsultAdvisorArgs::parse(Some(&json!({
            "stage": "planning",
            "tool": "run_tests",
            "metric": "  ",
            "context": "release week"
        })))
        .expect("args");
        assert_eq!(args.selector, Some((SelectorKind::Tool, "run_tests".to_string())));
        assert_eq!(args.score, 0.0);
        assert_eq!(args.context.as_deref(), Some("release week"));

        let bare = ConsultAdvisorArgs::parse(Some(&json!({}))).expect("bare");
        assert_eq!(bare.selector, None);
    }

    #[test]
    fn consultation_days_default_and_bounds() {
        assert_eq!(ConsultationLogArgs::parse(None).expect("default").days, 7);
        assert_eq!(
            ConsultationLogArgs::parse(Some(&json!({"days": -3}))).expect("neg").days,
            0
        );
        assert_eq!(
            ConsultationLogArgs::parse(Some(&json!({"days": 2.9}))).expect("float").days,
            2
        );
        assert_eq!(
            ConsultationLogArgs::parse(Some(&json!({"days": 1e12}))).expect("huge").days,
            MAX_READ_DAYS
        );
    }

    #[test]
    fn integer_days_clamp_like_numeric_days() {
        assert_eq!(days_from_integer(-3), days_from_number(-3.0));
        assert_eq!(days_from_integer(30), days_from_number(30.0));
        assert_eq!(days_from_integer(i64::MAX), days_from_number(1e12));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(arguments_object(Some(&json!([1]))).is_err());
        assert!(arguments_object(Some(&Value::Null)).expect("null").is_empty());
    }
}
