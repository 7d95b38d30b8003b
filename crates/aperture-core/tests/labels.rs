//! Label resolution tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use aperture_core::labels::{decode_value, resolve_labels};

fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn explicit_wins_over_ambient() {
    let ambient = [("tenant", "acme")];
    let explicit = map(&[("tenant", "other"), ("user", "kenobi")]);

    let out = resolve_labels(ambient, &explicit);
    assert_eq!(out, map(&[("tenant", "other"), ("user", "kenobi")]));
}

#[test]
fn ambient_keys_missing_from_explicit_are_kept_decoded() {
    let ambient = [("region", "eu%20west"), ("tier", "gold")];
    let explicit = map(&[("user", "kenobi")]);

    let out = resolve_labels(ambient, &explicit);
    assert_eq!(out.len(), 3);
    assert_eq!(out["region"], "eu west");
    assert_eq!(out["tier"], "gold");
    assert_eq!(out["user"], "kenobi");
}

#[test]
fn malformed_ambient_values_are_skipped() {
    let ambient = [("bad", "100%"), ("worse", "%zz"), ("utf", "%ff%fe"), ("good", "ok")];
    let out = resolve_labels(ambient, &HashMap::new());
    assert_eq!(out, map(&[("good", "ok")]));
}

#[test]
fn malformed_ambient_value_does_not_hide_explicit_label() {
    let out = resolve_labels([("user", "%g1")], &map(&[("user", "kenobi")]));
    assert_eq!(out["user"], "kenobi");
}

#[test]
fn later_ambient_layer_overrides_earlier() {
    let base = vec![("tenant".to_string(), "base".to_string())];
    let call = vec![("tenant".to_string(), "acme".to_string())];
    let out = resolve_labels(base.into_iter().chain(call), &HashMap::new());
    assert_eq!(out["tenant"], "acme");
}

#[test]
fn empty_inputs_give_empty_set() {
    let ambient: [(&str, &str); 0] = [];
    assert!(resolve_labels(ambient, &HashMap::new()).is_empty());
}

#[test]
fn decode_is_path_style() {
    assert_eq!(decode_value("a+b").as_deref(), Some("a+b"));
    assert_eq!(decode_value("a%2Bb").as_deref(), Some("a+b"));
    assert_eq!(decode_value("caf%C3%A9").as_deref(), Some("café"));
    assert_eq!(decode_value("%4"), None);
}
