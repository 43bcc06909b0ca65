//! Insight records produced by the rule-based generator

use serde::{Deserialize, Serialize};

use crate::domain::{Direction, MetricKey};

/// Severity of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Success,
    Warning,
    Info,
}

impl InsightKind {
    /// Leading glyph when rendering
    pub fn glyph(&self) -> &'static str {
        match self {
            InsightKind::Success => "✅",
            InsightKind::Warning => "⚠️",
            InsightKind::Info => "ℹ️",
        }
    }
}

/// A short observation or recommendation derived from the metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    /// Stable rule identifier, e.g. `sleep_warning`
    pub id: String,
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub recommendation: Option<String>,
    /// 1 is the most urgent
    pub priority: u8,
    pub metric: Option<MetricKey>,
    pub direction: Option<Direction>,
}

impl InsightRecord {
    /// Render as a display block
    pub fn render(&self) -> String {
        let mut text = format!("{} {}\n{}", self.kind.glyph(), self.title, self.description);
        if let Some(rec) = &self.recommendation {
            text.push_str(&format!("\n💡 {}", rec));
        }
        text
    }
}
