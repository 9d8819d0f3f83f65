//! Flattens provider-shaped review payloads into plain review texts.

use std::collections::HashSet;

use serde_json::Value;

/// Default cap on returned reviews.
pub const DEFAULT_MAX_REVIEWS: usize = 250;

/// Field names probed for review text, in priority order.
const TEXT_FIELDS: [&str; 5] = ["review_text", "text", "content", "review", "snippet"];

/// Extracts trimmed, non-empty, exact-deduplicated review texts from `raw`,
/// keeping first-seen order and at most `max` entries.
///
/// Looks at top-level arrays, `data` arrays (with nested arrays of place
/// blocks), each block's `reviews_data` or `reviews` array, the block itself,
/// and a top-level `reviews` array.
#[must_use]
pub fn sanitize(raw: &Value, max: usize) -> Vec<String> {
    let mut collector = Collector::new(max);

    let blocks = match raw.get("data") {
        Some(Value::Array(data)) => data.as_slice(),
        _ => raw.as_array().map_or(&[][..], Vec::as_slice),
    };
    for block in blocks {
        match block {
            Value::Array(inner) => inner.iter().for_each(|b| collector.block(b)),
            other => collector.block(other),
        }
    }

    if let Some(Value::Array(reviews)) = raw.get("reviews") {
        reviews.iter().for_each(|r| collector.push(r));
    }

    collector.finish()
}

struct Collector {
    max: usize,
    seen: HashSet<String>,
    texts: Vec<String>,
}

impl Collector {
    fn new(max: usize) -> Self {
        Self {
            max,
            seen: HashSet::new(),
            texts: Vec::new(),
        }
    }

    fn block(&mut self, block: &Value) {
        let nested = ["reviews_data", "reviews"]
            .iter()
            .find_map(|key| block.get(*key).and_then(Value::as_array));
        if let Some(reviews) = nested {
            reviews.iter().for_each(|r| self.push(r));
        }
        self.push(block);
    }

    fn push(&mut self, item: &Value) {
        if self.texts.len() >= self.max {
            return;
        }
        let Some(text) = review_text(item) else {
            return;
        };
        if self.seen.insert(text.to_owned()) {
            self.texts.push(text.to_owned());
        }
    }

    fn finish(self) -> Vec<String> {
        self.texts
    }
}

/// A bare string is its own text; objects are probed field by field.
fn review_text(item: &Value) -> Option<&str> {
    match item {
        Value::String(s) => non_blank(s),
        Value::Object(_) => TEXT_FIELDS
            .iter()
            .find_map(|field| item.get(*field).and_then(field_text)),
        _ => None,
    }
}

/// Accepts `"..."` or `{ "text": "..." }`.
fn field_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Object(_) => value.get("text").and_then(Value::as_str).and_then(non_blank),
        _ => None,
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
