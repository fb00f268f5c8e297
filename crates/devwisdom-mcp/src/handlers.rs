use std::sync::Arc;
use std::time::Instant;

use chrono::SecondsFormat;
use devwisdom_core::{
    consultation_mode, AdvisorInfo, Quote, SelectorKind, WisdomError, WisdomProvider,
};
use devwisdom_log::{Clock, ConsultationLog, ConsultationRecord, ADVISOR_CONSULTATION};
use serde::Serialize;
use serde_json::{json, Value};

use crate::args::{ConsultAdvisorArgs, ConsultationLogArgs, DailyBriefingArgs, GetWisdomArgs};
use crate::catalog::{tool_definitions, ResourceRoute, JSON_MIME, TOOL_NAMES};
use crate::config::{ServerConfig, MAX_BRIEFING_SOURCES};
use crate::error::ToolError;

/// Tool and resource handlers over a provider and an optional log.
pub struct WisdomHandlers {
    provider: Arc<dyn WisdomProvider>,
    log: Option<Arc<ConsultationLog>>,
    clock: Arc<dyn Clock>,
    default_source: String,
    briefing_sources: Vec<String>,
}

impl WisdomHandlers {
    pub fn new(
        provider: Arc<dyn WisdomProvider>,
        log: Option<Arc<ConsultationLog>>,
        clock: Arc<dyn Clock>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            provider,
            log,
            clock,
            default_source: config.default_source.clone(),
            briefing_sources: config.briefing_sources.clone(),
        }
    }

    pub fn log(&self) -> Option<&Arc<ConsultationLog>> {
        self.log.as_ref()
    }

    /// Runs a tool and returns its payload, before the MCP envelope.
    pub fn call_tool(&self, name: &str, arguments: Option<&Value>) -> Result<Value, ToolError> {
        let start = Instant::now();
        let result = match name {
            "consult_advisor" => self.consult_advisor(&ConsultAdvisorArgs::parse(arguments)?),
            "get_wisdom" => self.get_wisdom(&GetWisdomArgs::parse(arguments)?),
            "get_daily_briefing" => self.daily_briefing(&DailyBriefingArgs::parse(arguments)?),
            "get_consultation_log" => {
                self.consultation_log(ConsultationLogArgs::parse(arguments)?)
            }
            _ => {
                return Err(ToolError::invalid_params_with(
                    format!(
                        "unknown tool {name:?}; available tools: {}",
                        TOOL_NAMES.join(", ")
                    ),
                    json!({ "availableTools": TOOL_NAMES }),
                ))
            }
        };
        tracing::debug!(
            tool = name,
            ok = result.is_ok(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "tool call"
        );
        result
    }

    pub fn consult_advisor(&self, args: &ConsultAdvisorArgs) -> Result<Value, ToolError> {
        let advisor = match &args.selector {
            Some((kind, key)) => self
                .provider
                .lookup_advisor(*kind, key)
                .unwrap_or_else(|err| {
                    tracing::debug!("advisor fallback: {err}");
                    AdvisorInfo::fallback()
                }),
            None => AdvisorInfo::fallback(),
        };
        let quote = self
            .provider
            .lookup_quote(args.score, &advisor.advisor, self.clock.today())
            .unwrap_or_else(|err| {
                tracing::debug!("quote fallback: {err}");
                Quote::fallback()
            });
        let mode = consultation_mode(args.score);
        let advisor_name = self
            .provider
            .source_summary(&advisor.advisor)
            .map_or_else(|| advisor.advisor.clone(), |summary| summary.name);
        let selected = |kind: SelectorKind| {
            args.selector
                .as_ref()
                .filter(|(k, _)| *k == kind)
                .map(|(_, key)| key.clone())
        };

        let record = ConsultationRecord {
            timestamp: self.clock.now().to_rfc3339_opts(SecondsFormat::Secs, false),
            consultation_type: ADVISOR_CONSULTATION.to_string(),
            advisor: advisor.advisor,
            advisor_icon: advisor.icon,
            advisor_name,
            rationale: advisor.rationale,
            metric: selected(SelectorKind::Metric),
            tool: selected(SelectorKind::Tool),
            stage: selected(SelectorKind::Stage),
            score_at_time: args.score,
            consultation_mode: mode.name.to_string(),
            mode_icon: mode.icon.to_string(),
            mode_frequency: mode.frequency.to_string(),
            mode_guidance: Some(mode.guidance.to_string()),
            quote: quote.quote,
            quote_source: quote.source,
            encouragement: quote.encouragement,
            context: args.context.clone(),
            session_mode: None,
        };

        if let Some(log) = &self.log {
            if let Err(err) = log.append(&record) {
                tracing::warn!("failed to log consultation: {err}");
            }
        }
        Ok(serde_json::to_value(&record)?)
    }

    pub fn get_wisdom(&self, args: &GetWisdomArgs) -> Result<Value, ToolError> {
        let source = args.source.as_deref().unwrap_or(&self.default_source);
        match self
            .provider
            .lookup_quote(args.score, source, self.clock.today())
        {
            Ok(quote) => Ok(serde_json::to_value(quote)?),
            Err(err @ WisdomError::UnknownSource { .. }) => Err(ToolError::invalid_params_with(
                err.to_string(),
                json!({ "availableSources": self.provider.list_source_ids() }),
            )),
            Err(err) => Err(ToolError::Domain(format!("failed to get wisdom quote: {err}"))),
        }
    }

    pub fn daily_briefing(&self, args: &DailyBriefingArgs) -> Result<Value, ToolError> {
        let today = self.clock.today();
        let quotes = self
            .briefing_sources
            .iter()
            .take(MAX_BRIEFING_SOURCES)
            .filter_map(|id| match self.provider.lookup_quote(args.score, id, today) {
                Ok(quote) => Some(quote),
                Err(err) => {
                    tracing::debug!(source = %id, "briefing source skipped: {err}");
                    None
                }
            })
            .collect::<Vec<_>>();

        Ok(json!({
            "date": today.format("%Y-%m-%d").to_string(),
            "score": args.score,
            "mode": consultation_mode(args.score),
            "quotes": quotes,
            "sources": self.provider.list_source_ids(),
        }))
    }

    pub fn consultation_log(&self, args: ConsultationLogArgs) -> Result<Value, ToolError> {
        let consultations = self.read_log(args.days);
        Ok(json!({
            "days": args.days,
            "count": consultations.len(),
            "consultations": consultations,
        }))
    }

    fn read_log(&self, days: u32) -> Vec<ConsultationRecord> {
        let Some(log) = &self.log else {
            return Vec::new();
        };
        log.read(days).unwrap_or_else(|err| {
            tracing::warn!("failed to read consultation log: {err}");
            Vec::new()
        })
    }

    /// `resources/read` result for `uri`.
    pub fn read_resource(&self, uri: &str) -> Result<Value, ToolError> {
        let payload = match ResourceRoute::parse(uri)? {
            ResourceRoute::Tools => tool_definitions(),
            ResourceRoute::Sources => {
                let sources = self
                    .provider
                    .list_source_ids()
                    .iter()
                    .filter_map(|id| self.provider.source_summary(id))
                    .collect::<Vec<_>>();
                serde_json::to_value(sources)?
            }
            ResourceRoute::Advisors => json!({
                "metric_advisors": self.provider.advisors(SelectorKind::Metric),
                "tool_advisors": self.provider.advisors(SelectorKind::Tool),
                "stage_advisors": self.provider.advisors(SelectorKind::Stage),
            }),
            ResourceRoute::Advisor(id) => self.advisor_details(&id)?,
            ResourceRoute::Consultations(days) => serde_json::to_value(self.read_log(days))?,
        };
        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": JSON_MIME,
                "text": serde_json::to_string(&payload)?,
            }]
        }))
    }

    fn advisor_details(&self, id: &str) -> Result<Value, ToolError> {
        #[derive(Serialize)]
        struct AdvisorDetails<'a> {
            id: &'a str,
            #[serde(rename = "type")]
            kind: SelectorKind,
            #[serde(flatten)]
            info: AdvisorInfo,
        }

        let found = SelectorKind::PRIORITY.into_iter().find_map(|kind| {
            self.provider
                .lookup_advisor(kind, id)
                .ok()
                .map(|info| (kind, info))
        });
        let Some((kind, info)) = found else {
            return Err(ToolError::invalid_params(format!(
                "advisor not found: {id:?}; read wisdom://advisors to list available advisors"
            )));
        };
        Ok(serde_json::to_value(AdvisorDetails { id, kind, info })?)
    }
}

/// Wraps a tool payload in the MCP `tools/call` result envelope.
pub fn tool_result(payload: Value) -> Result<Value, ToolError> {
    let text = serde_json::to_string(&payload)?;
    Ok(json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": payload,
        "isError": false
    }))
}

pub fn tool_error_result(message: &str) -> Value {
    json!({
        "content": [{"type": "text", "text": message}],
        "isError": true
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Local, NaiveDate, TimeZone};
    use devwisdom_core::{SourceSummary, WisdomEngine};
    use devwisdom_log::FixedClock;

    use super::*;

    /// Provider whose quote lookups always miss.
    struct EmptyProvider;

    impl WisdomProvider for EmptyProvider {
        fn lookup_quote(
            &self,
            _score: f64,
            source_id: &str,
            _today: NaiveDate,
        ) -> Result<Quote, WisdomError> {
            Err(WisdomError::UnknownSource {
                id: source_id.to_string(),
            })
        }

        fn lookup_advisor(&self, kind: SelectorKind, key: &str) -> Result<AdvisorInfo, WisdomError> {
            Err(WisdomError::NoAdvisor {
                kind,
                key: key.to_string(),
            })
        }

        fn list_source_ids(&self) -> Vec<String> {
            Vec::new()
        }

        fn source_summary(&self, _id: &str) -> Option<SourceSummary> {
            None
        }

        fn advisors(&self, _kind: SelectorKind) -> BTreeMap<String, AdvisorInfo> {
            BTreeMap::new()
        }
    }

    fn clock() -> Arc<FixedClock> {
        let now = Local
            .with_ymd_and_hms(2024, 5, 6, 9, 30, 0)
            .single()
            .expect("local time");
        Arc::new(FixedClock::new(now))
    }

    fn handlers(provider: Arc<dyn WisdomProvider>, log: Option<Arc<ConsultationLog>>) -> WisdomHandlers {
        WisdomHandlers::new(provider, log, clock(), &ServerConfig::default())
    }

    #[test]
    fn consult_advisor_falls_back_when_provider_misses() {
        let handlers = handlers(Arc::new(EmptyProvider), None);
        let args = ConsultAdvisorArgs {
            selector: Some((SelectorKind::Metric, "security".to_string())),
            score: 20.0,
            context: None,
        };
        let value = handlers.consult_advisor(&args).expect("consult");
        assert_eq!(value["advisor"], "pistis_sophia");
        assert_eq!(value["rationale"], "Default wisdom advisor");
        assert_eq!(value["quote"], "Wisdom comes from experience.");
        assert_eq!(value["quote_source"], "Unknown");
        assert_eq!(value["encouragement"], "Keep learning and growing.");
        assert_eq!(value["metric"], "security");
        assert_eq!(value["consultation_mode"], "chaos");
        assert_eq!(value["timestamp"], clock().now().to_rfc3339_opts(SecondsFormat::Secs, false));
    }

    #[test]
    fn consult_advisor_appends_to_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = Arc::new(ConsultationLog::open(dir.path()).expect("log"));
        let handlers = WisdomHandlers::new(
            Arc::new(WisdomEngine::builtin()),
            Some(Arc::clone(&log)),
            Arc::new(devwisdom_log::SystemClock),
            &ServerConfig::default(),
        );
        let args = ConsultAdvisorArgs {
            selector: Some((SelectorKind::Stage, "debugging".to_string())),
            score: 65.0,
            context: Some("flaky test".to_string()),
        };
        let value = handlers.consult_advisor(&args).expect("consult");
        assert_eq!(value["advisor"], "bofh");
        assert_eq!(value["advisor_name"], "BOFH (Bastard Operator From Hell)");

        let records = log.read(1).expect("read");
        assert_eq!(records.len(), 1);
        assert_eq!(records.first().map(|r| r.stage.as_deref()), Some(Some("debugging")));

        let listed = handlers
            .consultation_log(ConsultationLogArgs { days: 7 })
            .expect("list");
        assert_eq!(listed["count"], 1);
    }

    #[test]
    fn briefing_drops_failing_sources() {
        let handlers = handlers(Arc::new(EmptyProvider), None);
        let value = handlers
            .daily_briefing(&DailyBriefingArgs { score: 50.0 })
            .expect("briefing");
        assert_eq!(value["date"], "2024-05-06");
        assert_eq!(value["quotes"], json!([]));
        assert_eq!(value["mode"]["name"], "building");

        let engine = handlers_with_engine();
        let value = engine
            .daily_briefing(&DailyBriefingArgs { score: 90.0 })
            .expect("briefing");
        assert_eq!(value["quotes"].as_array().map(Vec::len), Some(3));
    }

    fn handlers_with_engine() -> WisdomHandlers {
        handlers(Arc::new(WisdomEngine::builtin()), None)
    }

    #[test]
    fn get_wisdom_unknown_source_is_invalid_params() {
        let handlers = handlers_with_engine();
        let err = handlers
            .get_wisdom(&GetWisdomArgs {
                score: 50.0,
                source: Some("nope".to_string()),
            })
            .expect_err("unknown");
        assert!(matches!(err, ToolError::InvalidParams { .. }));
        assert!(err.to_string().contains("\"nope\""));
    }

    #[test]
    fn consultation_log_without_logger_is_empty() {
        let handlers = handlers_with_engine();
        let value = handlers
            .consultation_log(ConsultationLogArgs { days: 7 })
            .expect("log");
        assert_eq!(value, json!({"days": 7, "count": 0, "consultations": []}));
    }

    #[test]
    fn advisor_resource_reports_kind() {
        let handlers = handlers_with_engine();
        let result = handlers
            .read_resource("wisdom://advisor/run_tests")
            .expect("advisor");
        let text = result["contents"][0]["text"].as_str().expect("text");
        let details: Value = serde_json::from_str(text).expect("json");
        assert_eq!(details["type"], "tool");
        assert_eq!(details["advisor"], "stoic");

        let err = handlers
            .read_resource("wisdom://advisor/unheard_of")
            .expect_err("missing");
        assert!(err.to_string().contains("wisdom://advisors"));
    }
}
