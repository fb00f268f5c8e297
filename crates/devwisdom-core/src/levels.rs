use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Clamps a project health score into `[0, 100]`. NaN maps to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Project health stage used to pick quotes from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AeonLevel {
    Chaos,
    LowerAeons,
    MiddleAeons,
    UpperAeons,
    Treasury,
}

impl AeonLevel {
    pub const ALL: [Self; 5] = [
        Self::Chaos,
        Self::LowerAeons,
        Self::MiddleAeons,
        Self::UpperAeons,
        Self::Treasury,
    ];

    pub fn from_score(score: f64) -> Self {
        let score = clamp_score(score);
        if score < 30.0 {
            Self::Chaos
        } else if score < 50.0 {
            Self::LowerAeons
        } else if score < 70.0 {
            Self::MiddleAeons
        } else if score < 85.0 {
            Self::UpperAeons
        } else {
            Self::Treasury
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chaos => "chaos",
            Self::LowerAeons => "lower_aeons",
            Self::MiddleAeons => "middle_aeons",
            Self::UpperAeons => "upper_aeons",
            Self::Treasury => "treasury",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == raw)
    }
}

impl fmt::Display for AeonLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a project at a given health should consult its advisors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsultationMode {
    pub name: &'static str,
    pub icon: &'static str,
    pub frequency: &'static str,
    pub guidance: &'static str,
}

static MODES: [ConsultationMode; 4] = [
    ConsultationMode {
        name: "chaos",
        icon: "🔥",
        frequency: "every change",
        guidance: "The project is unstable. Consult before every significant change.",
    },
    ConsultationMode {
        name: "building",
        icon: "🏗️",
        frequency: "daily",
        guidance: "Foundations are forming. Check in daily and fix the weakest metric first.",
    },
    ConsultationMode {
        name: "maturing",
        icon: "🌱",
        frequency: "milestones",
        guidance: "The project is growing well. Consult at milestones and before releases.",
    },
    ConsultationMode {
        name: "mastery",
        icon: "🎯",
        frequency: "weekly",
        guidance: "Sustain the standard. A weekly reflection keeps drift away.",
    },
];

pub fn consultation_mode(score: f64) -> ConsultationMode {
    let [chaos, building, maturing, mastery] = MODES;
    let score = clamp_score(score);
    if score < 30.0 {
        chaos
    } else if score < 60.0 {
        building
    } else if score < 80.0 {
        maturing
    } else {
        mastery
    }
}
