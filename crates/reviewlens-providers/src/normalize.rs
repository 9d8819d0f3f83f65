//! Offline identifier extraction from pasted links, embeds, and free text.
//!
//! Nothing in this module touches the network. When no stable identifier can
//! be pulled out of the input, the cleaned text is handed to the resolver.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Url;
use reviewlens_core::Identifier;

static IFRAME_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<iframe\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid iframe regex")
});

static ENCODED_FEATURE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!16s([^!?&#]+)").expect("valid !16s regex"));

/// Result of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    /// Identifier extracted directly from the input, if any.
    pub candidate: Option<Identifier>,
    /// Input with HTML wrappers removed; a URL or free text.
    pub cleaned_text: String,
    /// Business name recovered from `/maps/place/<name>` or `q=<text>`.
    pub place_name: Option<String>,
}

impl NormalizedInput {
    /// Text to send to the place lookup service.
    #[must_use]
    pub fn lookup_text(&self) -> &str {
        self.place_name.as_deref().unwrap_or(&self.cleaned_text)
    }
}

/// Normalizes arbitrary pasted input.
///
/// 1. An `<iframe src="...">` wrapper is replaced by its `src`.
/// 2. For `http(s)` URLs, tries `q=place_id:` / `place_id=`, then numeric
///    `cid=`, then a `!16s` encoded `/g/` feature id.
/// 3. Otherwise returns no candidate and passes the cleaned text through.
///
/// Malformed URLs are never an error; they simply yield no candidate.
#[must_use]
pub fn normalize(raw: &str) -> NormalizedInput {
    let working = working_text(raw);

    if let id @ (Identifier::PlaceId(_) | Identifier::Cid(_)) = Identifier::parse(&working) {
        return NormalizedInput {
            candidate: Some(id),
            cleaned_text: working,
            place_name: None,
        };
    }

    let Some(url) = parse_http_url(&working) else {
        return NormalizedInput {
            candidate: None,
            cleaned_text: working,
            place_name: None,
        };
    };

    let candidate = place_id_from_query(&url)
        .or_else(|| cid_from_query(&url))
        .or_else(|| encoded_feature_id(&working));
    let place_name = if candidate.is_some() {
        None
    } else {
        place_name_hint(&url)
    };

    NormalizedInput {
        candidate,
        cleaned_text: working,
        place_name,
    }
}

/// Strips an iframe wrapper and trims. Fully percent-encoded links are
/// decoded once so they parse as URLs.
fn working_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let unwrapped = extract_iframe_src(trimmed).unwrap_or_else(|| trimmed.to_owned());

    if parse_http_url(&unwrapped).is_none() {
        let decoded = percent_decode_str(&unwrapped).decode_utf8_lossy();
        if parse_http_url(&decoded).is_some() {
            return decoded.trim().to_owned();
        }
    }
    unwrapped
}

/// Returns the `src` of the first iframe tag, with `&amp;` unescaped.
#[must_use]
pub fn extract_iframe_src(input: &str) -> Option<String> {
    IFRAME_SRC
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().replace("&amp;", "&"))
        .filter(|src| !src.is_empty())
}

fn parse_http_url(text: &str) -> Option<Url> {
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        text.as_bytes()
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme.as_bytes()))
    });
    if !has_scheme {
        return None;
    }
    Url::parse(text)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

fn is_place_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn place_id_from_query(url: &Url) -> Option<Identifier> {
    let from_q = url.query_pairs().find_map(|(key, value)| {
        (key == "q")
            .then(|| value.strip_prefix("place_id:").map(|id| id.trim().to_owned()))
            .flatten()
            .filter(|id| is_place_id(id))
    });
    from_q
        .or_else(|| {
            url.query_pairs().find_map(|(key, value)| {
                (key == "place_id")
                    .then(|| value.trim().to_owned())
                    .filter(|id| is_place_id(id))
            })
        })
        .map(Identifier::PlaceId)
}

fn cid_from_query(url: &Url) -> Option<Identifier> {
    url.query_pairs()
        .find_map(|(key, value)| {
            (key == "cid")
                .then(|| value.trim().to_owned())
                .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        })
        .map(Identifier::Cid)
}

/// Decodes a `!16s%2Fg%2F<id>` segment (possibly double-encoded) into
/// `place_id:g/<id>`.
fn encoded_feature_id(text: &str) -> Option<Identifier> {
    let segment = ENCODED_FEATURE_ID.captures(text)?.get(1)?.as_str();

    let mut decoded = segment.to_owned();
    for _ in 0..2 {
        if !decoded.contains('%') {
            break;
        }
        decoded = percent_decode_str(&decoded).decode_utf8().ok()?.into_owned();
    }

    let rest = decoded.strip_prefix("/g/")?;
    is_place_id(rest).then(|| Identifier::PlaceId(format!("g/{rest}")))
}

fn place_name_hint(url: &Url) -> Option<String> {
    let from_path = url.path().split("/place/").nth(1).and_then(|tail| {
        let segment = tail.split('/').next()?;
        let spaced = segment.replace('+', " ");
        let name = percent_decode_str(&spaced).decode_utf8_lossy().trim().to_owned();
        (!name.is_empty() && !name.starts_with('@')).then_some(name)
    });

    from_path.or_else(|| {
        url.query_pairs().find_map(|(key, value)| {
            let value = value.trim();
            (key == "q" && !value.is_empty() && !value.starts_with("place_id:"))
                .then(|| value.to_owned())
        })
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
