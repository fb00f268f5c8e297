use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::WisdomError;
use crate::levels::AeonLevel;

pub const BUILTIN_SOURCES_JSON: &str = include_str!("../data/sources.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    pub source: String,
    pub encouragement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wisdom_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wisdom_icon: Option<String>,
}

impl Quote {
    /// Returned by handlers when the provider has nothing for an advisor.
    pub fn fallback() -> Self {
        Self {
            quote: "Wisdom comes from experience.".to_string(),
            source: "Unknown".to_string(),
            encouragement: "Keep learning and growing.".to_string(),
            wisdom_source: None,
            wisdom_icon: None,
        }
    }

    fn silence() -> Self {
        Self {
            quote: "Silence is also wisdom.".to_string(),
            source: "Unknown".to_string(),
            encouragement: "Sometimes reflection is the answer.".to_string(),
            wisdom_source: None,
            wisdom_icon: None,
        }
    }
}

/// On-disk shape of a `sources.json` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesFile {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub quotes: BTreeMap<String, Vec<Quote>>,
}

impl SourceConfig {
    pub fn validate(self, id: &str) -> Result<Source, WisdomError> {
        let invalid = |reason: &str| WisdomError::InvalidSource {
            id: id.to_string(),
            reason: reason.to_string(),
        };
        if id.trim().is_empty() {
            return Err(invalid("source id is required"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("source name is required"));
        }
        let mut quotes = BTreeMap::new();
        for (level, list) in self.quotes {
            let Some(parsed) = AeonLevel::parse(&level) else {
                return Err(invalid(&format!("invalid aeon level {level:?}")));
            };
            quotes.insert(parsed, list);
        }
        if quotes.values().all(Vec::is_empty) {
            return Err(invalid("source must have at least one quote"));
        }
        Ok(Source {
            name: self.name,
            icon: self.icon,
            description: self.description,
            language: self.language,
            quotes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub icon: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub quotes: BTreeMap<AeonLevel, Vec<Quote>>,
}

impl Source {
    /// First quote of `level`, else of the first level that has any.
    pub fn quote_for(&self, level: AeonLevel) -> Quote {
        let chosen = self
            .quotes
            .get(&level)
            .and_then(|list| list.first())
            .or_else(|| self.quotes.values().find_map(|list| list.first()));
        let Some(quote) = chosen else {
            return Quote::silence();
        };
        let mut quote = quote.clone();
        if quote.wisdom_source.is_none() {
            quote.wisdom_source = Some(self.name.clone());
        }
        if quote.wisdom_icon.is_none() && !self.icon.is_empty() {
            quote.wisdom_icon = Some(self.icon.clone());
        }
        quote
    }
}

/// Parses a sources file, keeping valid sources and reporting the rest.
pub fn parse_sources(
    raw: &str,
) -> Result<(BTreeMap<String, Source>, Vec<WisdomError>), serde_json::Error> {
    let file: SourcesFile = serde_json::from_str(raw)?;
    let mut sources = BTreeMap::new();
    let mut rejected = Vec::new();
    for (id, config) in file.sources {
        match config.validate(&id) {
            Ok(source) => {
                sources.insert(id, source);
            }
            Err(err) => rejected.push(err),
        }
    }
    Ok((sources, rejected))
}

pub fn builtin_sources() -> BTreeMap<String, Source> {
    match parse_sources(BUILTIN_SOURCES_JSON) {
        Ok((sources, _)) if !sources.is_empty() => sources,
        _ => minimal_sources(),
    }
}

fn minimal_sources() -> BTreeMap<String, Source> {
    let mut quotes = BTreeMap::new();
    quotes.insert(
        AeonLevel::Chaos,
        vec![Quote {
            quote: "It's not a bug, it's a feature.".to_string(),
            source: "BOFH Excuse Calendar".to_string(),
            encouragement: "Document it and ship it.".to_string(),
            wisdom_source: None,
            wisdom_icon: None,
        }],
    );
    let mut sources = BTreeMap::new();
    sources.insert(
        "bofh".to_string(),
        Source {
            name: "BOFH (Bastard Operator From Hell)".to_string(),
            icon: "😈".to_string(),
            description: None,
            language: None,
            quotes,
        },
    );
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_parse_completely() {
        let (sources, rejected) = parse_sources(BUILTIN_SOURCES_JSON).expect("builtin json");
        assert!(rejected.is_empty(), "rejected builtin sources: {rejected:?}");
        for id in ["pistis_sophia", "stoic", "tao", "bofh"] {
            assert!(sources.contains_key(id), "missing builtin source {id}");
        }
    }

    #[test]
    fn quote_for_falls_back_to_any_level() {
        let sources = builtin_sources();
        let bofh = sources.get("bofh").expect("bofh");
        let quote = bofh.quote_for(AeonLevel::Treasury);
        assert!(!quote.quote.is_empty());
        assert_eq!(quote.wisdom_source.as_deref(), Some(bofh.name.as_str()));
    }

    #[test]
    fn validate_rejects_bad_levels_and_empty_sources() {
        let raw = r#"{
            "version": "1.0",
            "sources": {
                "ok": {"name": "Ok", "icon": "x", "quotes": {"chaos": [{"quote": "q", "source": "s", "encouragement": "e"}]}},
                "bad_level": {"name": "Bad", "quotes": {"nirvana": [{"quote": "q", "source": "s", "encouragement": "e"}]}},
                "no_name": {"quotes": {"chaos": [{"quote": "q", "source": "s", "encouragement": "e"}]}},
                "empty": {"name": "Empty", "quotes": {}}
            }
        }"#;
        let (sources, rejected) = parse_sources(raw).expect("parse");
        assert_eq!(sources.len(), 1);
        assert!(sources.contains_key("ok"));
        assert_eq!(rejected.len(), 3);
    }
}
