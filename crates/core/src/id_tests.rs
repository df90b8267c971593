// SPDX-License-Identifier: MIT

use super::*;

crate::define_id! {
    pub struct TestId("tst-");
}

#[test]
fn new_ids_have_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn from_string_round_trips() {
    let id = TestId::from_string("tst-abc123");
    assert_eq!(id.as_str(), "tst-abc123");
    assert_eq!(id.suffix(), "abc123");
}

#[test]
fn ids_compare_by_value() {
    let a = TestId::from_string("tst-same");
    let b = TestId::from_string("tst-same");
    assert_eq!(a, b);
}

#[test]
fn random_hex8_is_eight_lowercase_hex_chars() {
    let id = random_hex8();
    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn random_hex8_is_not_constant() {
    let a = random_hex8();
    let b = random_hex8();
    // Collisions are astronomically unlikely across 16^8 values.
    assert_ne!(a, b);
}

#[test]
fn short_truncates_but_never_panics_on_short_input() {
    assert_eq!(short("hello", 3), "hel");
    assert_eq!(short("hi", 10), "hi");
}
