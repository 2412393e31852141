//! Display classification of advisories
//!
//! Advisories are classified by keyword for rendering only. The engine never
//! looks at the classification.

use serde::{Deserialize, Serialize};
use std::fmt;

const WARNING_KEYWORDS: [&str; 3] = ["avoid", "monitor", "do not"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryKind {
    /// Something the farmer should hold off on or watch
    Warning,
    /// A recommendation or an all-clear
    Advice,
}

impl AdvisoryKind {
    /// Classify an advisory text by keyword
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if WARNING_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
            AdvisoryKind::Warning
        } else {
            AdvisoryKind::Advice
        }
    }

    /// Label printed in front of the advisory text
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AdvisoryKind::Warning => "WARNING",
            AdvisoryKind::Advice => "ADVICE",
        }
    }
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Advisory text with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedAdvisory {
    pub text: String,
    pub kind: AdvisoryKind,
}

impl ClassifiedAdvisory {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            kind: AdvisoryKind::classify(text),
        }
    }
}

impl fmt::Display for ClassifiedAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.text)
    }
}
