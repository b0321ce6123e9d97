//! Mapping from logical configuration keys to environment variable names.

/// Transforms a configuration key to environment variable format.
///
/// Every character is uppercased and both `.` and `-` become `_`:
/// `database.url` -> `DATABASE_URL`, `api-key` -> `API_KEY`.
///
/// Uppercasing follows Unicode full case mapping, so a character may expand
/// (`ß` -> `SS`).
///
/// Env-style providers must all go through this function so a logical key
/// maps to the same physical name everywhere.
pub fn format_env_key(key: &str) -> String {
    key.chars()
        .flat_map(char::to_uppercase)
        .map(|ch| match ch {
            '.' | '-' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_examples() {
        assert_eq!(format_env_key("simple"), "SIMPLE");
        assert_eq!(format_env_key("database.url"), "DATABASE_URL");
        assert_eq!(format_env_key("api-key"), "API_KEY");
        assert_eq!(
            format_env_key("complex.key-with-dashes"),
            "COMPLEX_KEY_WITH_DASHES"
        );
    }

    #[test]
    fn test_other_characters_untouched() {
        assert_eq!(format_env_key("a/b:c_d 1"), "A/B:C_D 1");
        assert_eq!(format_env_key(""), "");
    }

    #[test]
    fn test_non_ascii_uses_full_case_mapping() {
        assert_eq!(format_env_key("straße.größe"), "STRASSE_GRÖSSE");
        assert_eq!(format_env_key("STRASSE_GRÖSSE"), "STRASSE_GRÖSSE");
    }

    proptest! {
        #[test]
        fn format_is_idempotent(key in "[a-zA-Z0-9._:/ -]{0,40}") {
            let once = format_env_key(&key);
            prop_assert_eq!(format_env_key(&once), once);
        }
    }
}
