use serde_json::{json, Value};

use crate::args::days_from_integer;
use crate::error::ToolError;

pub const TOOL_NAMES: [&str; 4] = [
    "consult_advisor",
    "get_wisdom",
    "get_daily_briefing",
    "get_consultation_log",
];

pub const JSON_MIME: &str = "application/json";

const TOOLS_URI: &str = "wisdom://tools";
const SOURCES_URI: &str = "wisdom://sources";
const ADVISORS_URI: &str = "wisdom://advisors";
const ADVISOR_PREFIX: &str = "wisdom://advisor";
const CONSULTATIONS_PREFIX: &str = "wisdom://consultations";
const ADVISOR_TEMPLATE: &str = "wisdom://advisor/{id}";
const CONSULTATIONS_TEMPLATE: &str = "wisdom://consultations/{days}";

pub fn tool_definitions() -> Value {
    json!([
        {
            "name": "consult_advisor",
            "description": "Consult a wisdom advisor based on metric, tool, or stage",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "metric": {"type": "string", "description": "Metric name (e.g., 'security', 'testing')"},
                    "tool": {"type": "string", "description": "Tool name (e.g., 'project_scorecard')"},
                    "stage": {"type": "string", "description": "Stage name (e.g., 'daily_checkin')"},
                    "score": {"type": "number", "description": "Project health score (0-100)"},
                    "context": {"type": "string", "description": "Additional context for the consultation"}
                }
            }
        },
        {
            "name": "get_wisdom",
            "description": "Get a wisdom quote based on project health score and source",
            "inputSchema": {
                "type": "object",
                "required": ["score"],
                "properties": {
                    "score": {"type": "number", "description": "Project health score (0-100)"},
                    "source": {
                        "type": "string",
                        "description": "Wisdom source id (e.g., 'pistis_sophia', 'stoic') or 'random' for a date-seeded pick"
                    }
                }
            }
        },
        {
            "name": "get_daily_briefing",
            "description": "Get a daily wisdom briefing with quotes and guidance",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "score": {"type": "number", "description": "Project health score (0-100), default 50"}
                }
            }
        },
        {
            "name": "get_consultation_log",
            "description": "Retrieve consultation log entries",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "days": {"type": "number", "description": "Number of days to retrieve (default: 7)"}
                }
            }
        }
    ])
}

pub fn tools_list_result() -> Value {
    json!({ "tools": tool_definitions() })
}

#[derive(Debug, Clone, Copy)]
pub struct ResourceDef {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

static RESOURCES: [ResourceDef; 5] = [
    ResourceDef {
        uri: TOOLS_URI,
        name: "Available Tools",
        description: "List of available wisdom tools",
        mime_type: JSON_MIME,
    },
    ResourceDef {
        uri: SOURCES_URI,
        name: "Wisdom Sources",
        description: "List of available wisdom sources",
        mime_type: JSON_MIME,
    },
    ResourceDef {
        uri: ADVISORS_URI,
        name: "Advisors",
        description: "Advisors keyed by metric, tool and stage",
        mime_type: JSON_MIME,
    },
    ResourceDef {
        uri: ADVISOR_TEMPLATE,
        name: "Advisor Details",
        description: "Details for one advisor key",
        mime_type: JSON_MIME,
    },
    ResourceDef {
        uri: CONSULTATIONS_TEMPLATE,
        name: "Consultation Log",
        description: "Consultations from the last {days} days",
        mime_type: JSON_MIME,
    },
];

pub fn resources() -> &'static [ResourceDef] {
    &RESOURCES
}

pub fn resources_list_result() -> Value {
    let resources = resources()
        .iter()
        .map(|resource| {
            json!({
                "uri": resource.uri,
                "name": resource.name,
                "description": resource.description,
                "mimeType": resource.mime_type
            })
        })
        .collect::<Vec<_>>();
    json!({ "resources": resources })
}

/// A `resources/read` URI matched against the resource table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRoute {
    Tools,
    Sources,
    Advisors,
    Advisor(String),
    Consultations(u32),
}

impl ResourceRoute {
    pub fn parse(uri: &str) -> Result<Self, ToolError> {
        match uri {
            TOOLS_URI => return Ok(Self::Tools),
            SOURCES_URI => return Ok(Self::Sources),
            ADVISORS_URI => return Ok(Self::Advisors),
            _ => {}
        }

        if let Some(rest) = uri.strip_prefix(CONSULTATIONS_PREFIX) {
            let segment = single_segment(rest, uri, CONSULTATIONS_TEMPLATE)?;
            return parse_days(segment).map(Self::Consultations).ok_or_else(|| {
                ToolError::invalid_params(format!(
                    "invalid days {segment:?} in resource uri {uri:?}; expected {CONSULTATIONS_TEMPLATE} with an integer"
                ))
            });
        }
        if let Some(rest) = uri.strip_prefix(ADVISOR_PREFIX) {
            let segment = single_segment(rest, uri, ADVISOR_TEMPLATE)?;
            return Ok(Self::Advisor(segment.to_string()));
        }

        let valid = resources().iter().map(|r| r.uri).collect::<Vec<_>>();
        Err(ToolError::invalid_params_with(
            format!("unknown resource uri {uri:?}; valid uris: {}", valid.join(", ")),
            json!({ "availableResources": valid }),
        ))
    }
}

/// Signed decimal integer, clamped the same way as the tool's `days`.
/// Out-of-range integers saturate instead of failing.
fn parse_days(segment: &str) -> Option<u32> {
    let (negative, digits) = match segment.as_bytes().first() {
        Some(b'-') => (true, segment.get(1..)?),
        Some(b'+') => (false, segment.get(1..)?),
        _ => (false, segment),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let days = match digits.parse::<i64>() {
        Ok(days) if negative => -days,
        Ok(days) => days,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    };
    Some(days_from_integer(days))
}

fn single_segment<'a>(rest: &'a str, uri: &str, template: &str) -> Result<&'a str, ToolError> {
    rest.strip_prefix('/')
        .filter(|segment| !segment.is_empty() && !segment.contains('/'))
        .ok_or_else(|| {
            ToolError::invalid_params(format!(
                "malformed resource uri {uri:?}; expected {template}"
            ))
        })
}
