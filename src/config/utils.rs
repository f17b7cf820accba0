//! Small parsing helpers shared by the environment and YAML loaders.

use std::env;
use std::str::FromStr;

/// Read an environment variable, treating empty or whitespace-only values as unset.
pub(crate) fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an environment variable and parse it into `T`.
///
/// Returns `Ok(None)` when the variable is unset and an error naming the
/// variable when the value does not parse.
pub(crate) fn env_parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: '{raw}' ({e})")),
        None => Ok(None),
    }
}

/// Parse a boolean flag the way operators tend to write them.
pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean environment variable.
pub(crate) fn env_bool(name: &str) -> Result<Option<bool>, String> {
    match env_var(name) {
        Some(raw) => parse_bool(&raw)
            .map(Some)
            .ok_or_else(|| format!("Invalid boolean for {name}: '{raw}'")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    #[serial]
    fn test_env_var_ignores_blank_values() {
        unsafe {
            env::set_var("VOICE_UTILS_TEST_BLANK", "   ");
        }
        assert_eq!(env_var("VOICE_UTILS_TEST_BLANK"), None);
        unsafe {
            env::remove_var("VOICE_UTILS_TEST_BLANK");
        }
    }

    #[test]
    #[serial]
    fn test_env_parse_reports_variable_name() {
        unsafe {
            env::set_var("VOICE_UTILS_TEST_NUM", "abc");
        }
        let err = env_parse::<u32>("VOICE_UTILS_TEST_NUM").unwrap_err();
        assert!(err.contains("VOICE_UTILS_TEST_NUM"));
        unsafe {
            env::remove_var("VOICE_UTILS_TEST_NUM");
        }
        assert_eq!(env_parse::<u32>("VOICE_UTILS_TEST_NUM").unwrap(), None);
    }
}
