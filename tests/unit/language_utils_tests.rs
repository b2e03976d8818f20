/*!
 * Tests for language code utilities
 */

use digcomp_l10n::language_utils::{
    get_language_name, is_dutch, language_codes_match, normalize_to_part2t, validate_language_code,
};

#[test]
fn test_normalize_to_part2t_withVariousCodes_shouldNormalize() {
    assert_eq!(normalize_to_part2t("nl").unwrap(), "nld");
    assert_eq!(normalize_to_part2t(" EN ").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("dut").unwrap(), "nld");
    assert!(normalize_to_part2t("xx").is_err());
}

#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("nl", "nld"));
    assert!(language_codes_match("nl", "dut"));
    assert!(!language_codes_match("nl", "en"));
    assert!(!language_codes_match("nl", "invalid"));
}

#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(get_language_name("nl").unwrap(), "Dutch");
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert!(get_language_name("").is_err());
}

#[test]
fn test_is_dutch_shouldAcceptAllDutchCodes() {
    assert!(is_dutch("nl"));
    assert!(is_dutch("NLD"));
    assert!(!is_dutch("en"));
    assert!(validate_language_code("de").is_ok());
}
