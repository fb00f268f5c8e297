use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WisdomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    Metric,
    Tool,
    Stage,
}

impl SelectorKind {
    /// Lookup priority used when a caller supplies several selectors.
    pub const PRIORITY: [Self; 3] = [Self::Metric, Self::Tool, Self::Stage];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Tool => "tool",
            Self::Stage => "stage",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorInfo {
    pub advisor: String,
    pub icon: String,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helps_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AdvisorInfo {
    /// Advisor used whenever no selector is given or a selector misses.
    pub fn fallback() -> Self {
        Self {
            advisor: "pistis_sophia".to_string(),
            icon: "📜".to_string(),
            rationale: "Default wisdom advisor".to_string(),
            helps_with: None,
            language: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AdvisorEntry {
    key: &'static str,
    advisor: &'static str,
    icon: &'static str,
    rationale: &'static str,
    helps_with: &'static str,
    language: &'static str,
}

impl AdvisorEntry {
    fn to_info(self) -> AdvisorInfo {
        let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());
        AdvisorInfo {
            advisor: self.advisor.to_string(),
            icon: self.icon.to_string(),
            rationale: self.rationale.to_string(),
            helps_with: non_empty(self.helps_with),
            language: non_empty(self.language),
        }
    }
}

const fn entry(
    key: &'static str,
    advisor: &'static str,
    icon: &'static str,
    rationale: &'static str,
    helps_with: &'static str,
    language: &'static str,
) -> AdvisorEntry {
    AdvisorEntry {
        key,
        advisor,
        icon,
        rationale,
        helps_with,
        language,
    }
}

static METRIC_ADVISORS: [AdvisorEntry; 14] = [
    entry("security", "bofh", "😈", "BOFH is paranoid about security, expects users to break everything", "Finding vulnerabilities, defensive thinking, access control", ""),
    entry("testing", "stoic", "🏛️", "Stoics teach discipline through adversity - tests reveal truth", "Persistence through failures, accepting harsh feedback", ""),
    entry("documentation", "confucius", "🎓", "Confucius emphasized teaching and transmitting wisdom", "Clear explanations, teaching future maintainers", ""),
    entry("completion", "art_of_war", "⚔️", "Sun Tzu teaches strategy and decisive execution", "Prioritization, knowing when to attack vs wait", ""),
    entry("alignment", "tao", "☯️", "Tao emphasizes balance, flow, and purpose", "Ensuring work serves project goals, finding harmony", ""),
    entry("clarity", "gracian", "🎭", "Gracián's maxims are models of clarity and pragmatism", "Simplifying complexity, clear communication", ""),
    entry("ci_cd", "kybalion", "⚗️", "Kybalion teaches cause and effect - CI/CD is pure causation", "Understanding pipelines, automation philosophy", ""),
    entry("dogfooding", "murphy", "🔧", "Murphy's Law: if it can break, it will - use your own tools!", "Finding edge cases, eating your own cooking", ""),
    entry("uniqueness", "shakespeare", "🎭", "Shakespeare created unique works that transcended his time", "Creative differentiation, memorable design", ""),
    entry("codebase", "enochian", "🔮", "Enochian mysticism reveals hidden structure and patterns", "Architecture, finding hidden connections", ""),
    entry("parallelizable", "tao_of_programming", "💻", "The Tao of Programming teaches elegant parallel design", "Decomposition, independent task design", ""),
    entry("ethics", "rebbe", "🕎", "The Rebbe teaches ethical conduct and righteous behavior", "Code ethics, proper conduct, doing the right thing", "hebrew"),
    entry("perseverance", "tzaddik", "✡️", "The Tzaddik demonstrates steadfast commitment", "Persistence, staying on the righteous path, not giving up", "hebrew"),
    entry("wisdom", "chacham", "📜", "The Chacham seeks deep understanding through study", "Deep analysis, seeking understanding, learning from tradition", "hebrew"),
];

static TOOL_ADVISORS: [AdvisorEntry; 12] = [
    entry("project_scorecard", "pistis_sophia", "📜", "Journey through aeons mirrors project health stages", "", ""),
    entry("project_overview", "kybalion", "⚗️", "Hermetic principles for holistic understanding", "", ""),
    entry("sprint_automation", "art_of_war", "⚔️", "Sprint is a campaign requiring strategy", "", ""),
    entry("check_documentation_health", "confucius", "🎓", "Teaching requires good documentation", "", ""),
    entry("analyze_todo2_alignment", "tao", "☯️", "Alignment is balance and flow", "", ""),
    entry("detect_duplicate_tasks", "bofh", "😈", "Duplicates are user error manifested", "", ""),
    entry("scan_dependency_security", "bofh", "😈", "Security paranoia is a feature", "", ""),
    entry("run_tests", "stoic", "🏛️", "Tests teach through failure", "", ""),
    entry("validate_ci_cd_workflow", "kybalion", "⚗️", "CI/CD is cause and effect", "", ""),
    entry("dev_reload", "murphy", "🔧", "Hot reload because Murphy says restarts will fail at the worst time", "", ""),
    entry("ethics_check", "rebbe", "🕎", "Rebbe guides ethical code review and conduct", "", "hebrew"),
    entry("wisdom_reflection", "chacham", "📜", "Chacham provides deep wisdom for retrospectives", "", "hebrew"),
];

static STAGE_ADVISORS: [AdvisorEntry; 10] = [
    entry("daily_checkin", "pistis_sophia", "📜", "Start each day with enlightenment journey wisdom", "", ""),
    entry("planning", "art_of_war", "⚔️", "Planning is strategy - Sun Tzu is the master", "", ""),
    entry("implementation", "tao_of_programming", "💻", "During coding, let the code flow naturally", "", ""),
    entry("debugging", "bofh", "😈", "BOFH knows all the ways things break", "", ""),
    entry("review", "stoic", "🏛️", "Review requires accepting harsh truths with equanimity", "", ""),
    entry("retrospective", "confucius", "🎓", "Retrospectives are about learning and teaching", "", ""),
    entry("celebration", "shakespeare", "🎭", "Celebrate with drama and poetry!", "", ""),
    entry("shabbat", "rebbe", "🕎", "Shabbat is for reflection and spiritual renewal", "", "hebrew"),
    entry("teshuvah", "tzaddik", "✡️", "Teshuvah is for fixing past mistakes and returning to the right path", "", "hebrew"),
    entry("learning", "chacham", "📜", "Study and continuous learning", "", "hebrew"),
];

/// Keyed advisor tables for metrics, tools and stages.
#[derive(Debug, Clone, Default)]
pub struct AdvisorRegistry {
    metric: BTreeMap<String, AdvisorInfo>,
    tool: BTreeMap<String, AdvisorInfo>,
    stage: BTreeMap<String, AdvisorInfo>,
}

impl AdvisorRegistry {
    pub fn builtin() -> Self {
        let collect = |table: &[AdvisorEntry]| {
            table
                .iter()
                .map(|e| (e.key.to_string(), e.to_info()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            metric: collect(&METRIC_ADVISORS),
            tool: collect(&TOOL_ADVISORS),
            stage: collect(&STAGE_ADVISORS),
        }
    }

    fn table(&self, kind: SelectorKind) -> &BTreeMap<String, AdvisorInfo> {
        match kind {
            SelectorKind::Metric => &self.metric,
            SelectorKind::Tool => &self.tool,
            SelectorKind::Stage => &self.stage,
        }
    }

    pub fn lookup(&self, kind: SelectorKind, key: &str) -> Result<AdvisorInfo, WisdomError> {
        self.table(kind)
            .get(key)
            .cloned()
            .ok_or_else(|| WisdomError::NoAdvisor {
                kind,
                key: key.to_string(),
            })
    }

    pub fn all(&self, kind: SelectorKind) -> &BTreeMap<String, AdvisorInfo> {
        self.table(kind)
    }
}
