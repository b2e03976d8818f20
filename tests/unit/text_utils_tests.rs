/*!
 * Tests for text normalisation, slugs and hashing
 */

use digcomp_l10n::text_utils::{
    NaturalKey, clean_text, is_sha1_hex, join_hard_wrapped_lines, norm_ci, norm_ws, normalize_for_hash, sha1_hex,
    short_hash, slugify_section, slugify_term,
};

#[test]
fn test_normalize_for_hash_shouldCollapseSpacesAndTrimLines() {
    assert_eq!(normalize_for_hash("  a\u{00A0}\u{00A0}b \r\n\tc  "), "a b\nc");
    assert_eq!(normalize_for_hash("\n\n  x  \n\n"), "x");
    assert_eq!(normalize_for_hash("a\n\nb"), "a\n\nb");
    assert_eq!(normalize_for_hash("   "), "");
}

#[test]
fn test_sha1_of_normalized_text_shouldBeStableAcrossWhitespace() {
    let a = sha1_hex(&normalize_for_hash("Digital  competence "));
    let b = sha1_hex(&normalize_for_hash("Digital competence"));
    assert_eq!(a, b);
    assert!(is_sha1_hex(&a));
    assert_eq!(short_hash("x"), &sha1_hex("x")[..12]);
    assert!(!is_sha1_hex("ABC"));
}

#[test]
fn test_clean_text_shouldCollapseRepeatedParentheses() {
    assert_eq!(clean_text("((AI))  tools \r\n  next "), "(AI) tools\nnext");
}

#[test]
fn test_norm_helpers_shouldKeepLineBreaks() {
    assert_eq!(norm_ws("  a \t b\r\nc "), "a b\nc");
    assert_eq!(norm_ci(" Annex\u{00A0}1 \n  Glossary"), "annex 1\nglossary");
}

#[test]
fn test_join_hard_wrapped_lines_shouldKeepBlankLineBoundaries() {
    assert_eq!(join_hard_wrapped_lines("one\ntwo\n\nthree"), "one two\n\nthree");
}

#[test]
fn test_slugs_shouldBeLowerSnakeCase() {
    assert_eq!(slugify_term("  Digital content (DC) "), "digital_content_dc");
    assert_eq!(slugify_section("Annex 1: Glossary"), "annex_1:_glossary");
    assert_eq!(slugify_section("!!!"), "section");
}

#[test]
fn test_natural_key_shouldOrderNumericParts() {
    let mut ids = vec!["1.10", "1.2", "2", "1.2.a", "1"];
    ids.sort_by_key(|id| NaturalKey::new(id));
    assert_eq!(ids, vec!["1", "1.2", "1.2.a", "1.10", "2"]);
}
