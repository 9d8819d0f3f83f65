use super::*;

fn place(id: &str) -> Option<Identifier> {
    Some(Identifier::PlaceId(id.to_owned()))
}

// ---------------------------------------------------------------------------
// place_id extraction
// ---------------------------------------------------------------------------

#[test]
fn extracts_q_place_id_parameter() {
    let n = normalize("https://maps.google.com/maps?q=place_id:ChIJabc123");
    assert_eq!(n.candidate, place("ChIJabc123"));
    assert_eq!(n.cleaned_text, "https://maps.google.com/maps?q=place_id:ChIJabc123");
}

#[test]
fn extracts_encoded_q_place_id_parameter() {
    let n = normalize("https://www.google.com/maps/search/?api=1&q=place_id%3AChIJ_x-Y9");
    assert_eq!(n.candidate, place("ChIJ_x-Y9"));
}

#[test]
fn extracts_place_id_parameter() {
    let n = normalize(
        "https://www.google.com/maps/search/?api=1&query=Cafe&query_place_id=nope&place_id=ChIJN1t_tDeuEmsRUsoyG83frY4",
    );
    assert_eq!(n.candidate, place("ChIJN1t_tDeuEmsRUsoyG83frY4"));
}

#[test]
fn q_place_id_takes_priority_over_place_id_param() {
    let n = normalize("https://maps.google.com/?place_id=SECOND&q=place_id:FIRST");
    assert_eq!(n.candidate, place("FIRST"));
}

#[test]
fn rejects_place_id_with_invalid_characters() {
    let n = normalize("https://maps.google.com/?place_id=abc%20def");
    assert_eq!(n.candidate, None);
}

// ---------------------------------------------------------------------------
// cid extraction
// ---------------------------------------------------------------------------

#[test]
fn extracts_numeric_cid() {
    let n = normalize("https://maps.google.com/?cid=1234567890123456789");
    assert_eq!(n.candidate, Some(Identifier::Cid("1234567890123456789".into())));
}

#[test]
fn ignores_non_numeric_cid() {
    let n = normalize("https://maps.google.com/?cid=12ab");
    assert_eq!(n.candidate, None);
}

#[test]
fn place_id_beats_cid() {
    let n = normalize("https://maps.google.com/?cid=42&place_id=ChIJx");
    assert_eq!(n.candidate, place("ChIJx"));
}

// ---------------------------------------------------------------------------
// !16s encoded feature ids
// ---------------------------------------------------------------------------

#[test]
fn extracts_encoded_feature_id_from_place_url() {
    let url = "https://www.google.com/maps/place/Joe's+Pizza/@40.73,-73.99,17z/data=!3m1!4b1!4m6!3m5!1s0x0:0x1!8m2!3d40.73!4d-73.99!16s%2Fg%2F11c1q2w3e4?entry=ttu";
    let n = normalize(url);
    assert_eq!(n.candidate, place("g/11c1q2w3e4"));
}

#[test]
fn extracts_double_encoded_feature_id() {
    let n = normalize("https://www.google.com/maps/embed?pb=!1m18!16s%252Fg%252F1tdk3xyz!5e0");
    assert_eq!(n.candidate, place("g/1tdk3xyz"));
}

#[test]
fn ignores_feature_id_outside_g_namespace() {
    let n = normalize("https://www.google.com/maps/place/X/data=!16s%2Fm%2F0abc");
    assert_eq!(n.candidate, None);
}

// ---------------------------------------------------------------------------
// iframe unwrapping
// ---------------------------------------------------------------------------

#[test]
fn iframe_wrapping_is_transparent() {
    let bare = "https://www.google.com/maps/embed/v1/place?key=K&q=place_id:ChIJiframe";
    let wrapped = format!(
        r#"<iframe width="600" height="450" style="border:0" loading="lazy" src="{bare}"></iframe>"#
    );
    assert_eq!(normalize(&wrapped), normalize(bare));
    assert_eq!(normalize(&wrapped).candidate, place("ChIJiframe"));
}

#[test]
fn iframe_with_single_quotes_and_escaped_ampersands() {
    let wrapped =
        "<IFRAME SRC='https://maps.google.com/maps?hl=en&amp;cid=987654'></IFRAME>";
    let n = normalize(wrapped);
    assert_eq!(n.candidate, Some(Identifier::Cid("987654".into())));
    assert_eq!(n.cleaned_text, "https://maps.google.com/maps?hl=en&cid=987654");
}

#[test]
fn extract_iframe_src_returns_none_without_iframe() {
    assert_eq!(extract_iframe_src("<div src=\"x\"></div>"), None);
}

// ---------------------------------------------------------------------------
// pass-through cases
// ---------------------------------------------------------------------------

#[test]
fn free_text_passes_through_trimmed() {
    let n = normalize("   Joe's Pizza, 7 Carmine St, New York  ");
    assert_eq!(n.candidate, None);
    assert_eq!(n.cleaned_text, "Joe's Pizza, 7 Carmine St, New York");
    assert_eq!(n.lookup_text(), "Joe's Pizza, 7 Carmine St, New York");
}

#[test]
fn short_link_passes_through_for_resolution() {
    let n = normalize("https://maps.app.goo.gl/AbCdEf123");
    assert_eq!(n.candidate, None);
    assert_eq!(n.cleaned_text, "https://maps.app.goo.gl/AbCdEf123");
    assert_eq!(n.place_name, None);
}

#[test]
fn malformed_url_does_not_panic() {
    let n = normalize("https://[::1/maps?place_id=abc");
    assert_eq!(n.candidate, None);
    assert_eq!(n.cleaned_text, "https://[::1/maps?place_id=abc");
}

#[test]
fn multibyte_host_is_still_parsed_as_url() {
    let n = normalize("http://écafe.example/maps?cid=42");
    assert_eq!(n.candidate, Some(Identifier::Cid("42".into())));
}

#[test]
fn scheme_match_ignores_case() {
    let n = normalize("HTTPS://maps.google.com/?cid=7");
    assert_eq!(n.candidate, Some(Identifier::Cid("7".into())));
}

#[test]
fn canonical_identifier_strings_are_accepted() {
    assert_eq!(normalize("place_id:ChIJdirect").candidate, place("ChIJdirect"));
    assert_eq!(
        normalize("cid:555").candidate,
        Some(Identifier::Cid("555".into()))
    );
}

#[test]
fn fully_encoded_url_is_decoded_before_extraction() {
    let n = normalize("https%3A%2F%2Fmaps.google.com%2F%3Fcid%3D31337");
    assert_eq!(n.candidate, Some(Identifier::Cid("31337".into())));
}

// ---------------------------------------------------------------------------
// place name hints
// ---------------------------------------------------------------------------

#[test]
fn place_name_hint_from_place_path() {
    let n = normalize("https://www.google.com/maps/place/Joe's+Pizza/@40.73,-73.99,17z");
    assert_eq!(n.candidate, None);
    assert_eq!(n.place_name.as_deref(), Some("Joe's Pizza"));
    assert_eq!(n.lookup_text(), "Joe's Pizza");
}

#[test]
fn place_name_hint_from_query_text() {
    let n = normalize("https://maps.google.com/maps?q=Blue+Bottle+Coffee+Oakland");
    assert_eq!(n.place_name.as_deref(), Some("Blue Bottle Coffee Oakland"));
}

#[test]
fn place_name_hint_decodes_percent_escapes() {
    let n = normalize("https://www.google.com/maps/place/Caf%C3%A9+Luna/data=!4m2");
    assert_eq!(n.place_name.as_deref(), Some("Café Luna"));
}
