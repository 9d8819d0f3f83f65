use serde::{Serialize, Serializer};

/// Canonical, provider-agnostic key for a business.
///
/// Rendered as `place_id:<id>`, `cid:<n>`, or the raw query text. Adapters
/// translate each variant into their own request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Google place id, including `g/...` knowledge-graph ids.
    PlaceId(String),
    /// Google Maps customer id (numeric).
    Cid(String),
    /// Free text or an unresolved URL passed through as a search query.
    Query(String),
}

impl Identifier {
    /// Parses the canonical string form back into an `Identifier`.
    ///
    /// Anything without a recognised prefix (or with an empty value) is a
    /// `Query`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(id) = trimmed.strip_prefix("place_id:").filter(|v| !v.is_empty()) {
            return Identifier::PlaceId(id.to_owned());
        }
        if let Some(cid) = trimmed
            .strip_prefix("cid:")
            .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        {
            return Identifier::Cid(cid.to_owned());
        }
        Identifier::Query(trimmed.to_owned())
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::PlaceId(id) => write!(f, "place_id:{id}"),
            Identifier::Cid(cid) => write!(f, "cid:{cid}"),
            Identifier::Query(text) => f.write_str(text),
        }
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
