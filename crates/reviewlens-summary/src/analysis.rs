//! Analysis shape and the one parser every completion goes through.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SummaryError;

pub const MAX_POSITIVES: usize = 5;
pub const MAX_NEGATIVES: usize = 5;
pub const MAX_ACTIONS: usize = 12;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:top\s+\d+\s+)?(positives?|negatives?|complaints?|action\s+steps?|actions?|summary)$",
    )
    .expect("valid heading regex")
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s+(.+)$").expect("valid bullet regex"));

/// Recurring themes and next steps distilled from a set of reviews.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub positives: Vec<String>,
    pub negatives: Vec<String>,
    pub actions: Vec<String>,
    pub summary: String,
}

impl Analysis {
    fn is_empty(&self) -> bool {
        self.positives.is_empty()
            && self.negatives.is_empty()
            && self.actions.is_empty()
            && self.summary.is_empty()
    }

    fn capped(mut self) -> Self {
        self.positives.truncate(MAX_POSITIVES);
        self.negatives.truncate(MAX_NEGATIVES);
        self.actions.truncate(MAX_ACTIONS);
        self
    }
}

/// JSON object as requested from the model. Items may be plain strings or
/// small objects such as `{"theme": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructuredAnalysis {
    #[serde(default)]
    pub positives: Option<Value>,
    #[serde(default, alias = "complaints")]
    pub negatives: Option<Value>,
    #[serde(default, alias = "action_steps", alias = "suggestions")]
    pub actions: Option<Value>,
    #[serde(default)]
    pub summary: Option<Value>,
}

/// A completion is either the requested JSON object or labelled free text.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryResponse {
    Structured(StructuredAnalysis),
    FreeText(String),
}

impl SummaryResponse {
    /// Classifies raw completion content. Markdown code fences are ignored.
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        let body = strip_code_fence(content);
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
            if let Ok(structured) = serde_json::from_value(Value::Object(map)) {
                return SummaryResponse::Structured(structured);
            }
        }
        SummaryResponse::FreeText(content.to_owned())
    }

    /// Converts either shape into a capped [`Analysis`].
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Unparseable`] when nothing usable was found.
    pub fn into_analysis(self) -> Result<Analysis, SummaryError> {
        let analysis = match self {
            SummaryResponse::Structured(s) => Analysis {
                positives: items(s.positives.as_ref()),
                negatives: items(s.negatives.as_ref()),
                actions: items(s.actions.as_ref()),
                summary: s
                    .summary
                    .as_ref()
                    .and_then(item_text)
                    .unwrap_or_default(),
            },
            SummaryResponse::FreeText(text) => parse_labelled_text(&text),
        };
        if analysis.is_empty() {
            return Err(SummaryError::Unparseable(
                "no positives, negatives, actions, or summary".to_owned(),
            ));
        }
        Ok(analysis.capped())
    }
}

/// Parses completion content of either shape.
///
/// # Errors
///
/// Returns [`SummaryError::Unparseable`] when nothing usable was found.
pub fn parse_analysis(content: &str) -> Result<Analysis, SummaryError> {
    SummaryResponse::from_content(content).into_analysis()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn items(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(list)) => list.iter().filter_map(item_text).collect(),
        Some(other) => item_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn item_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => ["theme", "text", "title", "item", "description"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Positives,
    Negatives,
    Actions,
    Summary,
}

fn section_for(label: &str) -> Option<Section> {
    let caps = HEADING.captures(label.trim())?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();
    let section = if name.starts_with("positive") {
        Section::Positives
    } else if name.starts_with("negative") || name.starts_with("complaint") {
        Section::Negatives
    } else if name.starts_with("action") {
        Section::Actions
    } else {
        Section::Summary
    };
    Some(section)
}

/// Recognises `Label:` / `Label: inline text` / `## Label` heading lines.
fn heading(line: &str) -> Option<(Section, &str)> {
    let stripped = line.trim_start_matches('#').trim().trim_matches('*').trim();
    match stripped.split_once(':') {
        Some((label, rest)) => {
            let section = section_for(label.trim_end_matches('*'))?;
            Some((section, rest.trim().trim_start_matches('*').trim()))
        }
        None => section_for(stripped).map(|s| (s, "")),
    }
}

fn parse_labelled_text(text: &str) -> Analysis {
    let mut analysis = Analysis::default();
    let mut current: Option<Section> = None;
    let mut summary_lines: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((section, rest)) = heading(line) {
            current = Some(section);
            if !rest.is_empty() {
                push_line(&mut analysis, &mut summary_lines, section, rest);
            }
            continue;
        }
        let Some(section) = current else {
            continue;
        };
        let content = BULLET
            .captures(line)
            .and_then(|c| c.get(1))
            .map_or(line, |m| m.as_str());
        push_line(&mut analysis, &mut summary_lines, section, content);
    }

    analysis.summary = summary_lines.join(" ");
    analysis
}

fn push_line<'a>(
    analysis: &mut Analysis,
    summary_lines: &mut Vec<&'a str>,
    section: Section,
    content: &'a str,
) {
    let content = content.trim();
    if content.is_empty() {
        return;
    }
    match section {
        Section::Positives => analysis.positives.push(content.to_owned()),
        Section::Negatives => analysis.negatives.push(content.to_owned()),
        Section::Actions => analysis.actions.push(content.to_owned()),
        Section::Summary => summary_lines.push(content),
    }
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;
