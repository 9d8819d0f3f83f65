use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Third-party review-data providers with a concrete adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Outscraper,
    SerpApi,
    GooglePlaces,
}

impl ProviderKind {
    /// Priority order used when `REVIEWLENS_PROVIDER_ORDER` is unset.
    pub const DEFAULT_ORDER: [ProviderKind; 3] = [
        ProviderKind::Outscraper,
        ProviderKind::SerpApi,
        ProviderKind::GooglePlaces,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Outscraper => "outscraper",
            ProviderKind::SerpApi => "serp_api",
            ProviderKind::GooglePlaces => "google_places",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outscraper" => Ok(ProviderKind::Outscraper),
            "serpapi" | "serp_api" => Ok(ProviderKind::SerpApi),
            "google_places" | "places" => Ok(ProviderKind::GooglePlaces),
            other => Err(format!("unknown provider \"{other}\"")),
        }
    }
}

/// Parses a comma-separated priority list, rejecting unknown names and
/// dropping repeats so each provider is tried at most once.
///
/// # Errors
///
/// Returns a description of the first unrecognised entry, or of an empty list.
pub fn parse_provider_order(raw: &str) -> Result<Vec<ProviderKind>, String> {
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: ProviderKind = part.parse()?;
        if !order.contains(&kind) {
            order.push(kind);
        }
    }
    if order.is_empty() {
        return Err("provider order must name at least one provider".to_owned());
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_order_and_drops_duplicates() {
        let order = parse_provider_order("serpapi, outscraper,serpapi").unwrap();
        assert_eq!(order, vec![ProviderKind::SerpApi, ProviderKind::Outscraper]);
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = parse_provider_order("outscraper,yelp").unwrap_err();
        assert!(err.contains("yelp"), "got: {err}");
    }

    #[test]
    fn rejects_empty_order() {
        assert!(parse_provider_order(" , ").is_err());
    }
}
