use std::sync::LazyLock;

use regex::Regex;

/// Matches `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*env\.([A-Za-z0-9_]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
        .expect("valid placeholder pattern")
});

/// Expand `{{ env.VAR }}` placeholders in a raw TOML string
///
/// An optional default is written `{{ env.VAR | default("fallback") }}`;
/// without one, an unset variable is an error. Comment lines are passed
/// through unchanged.
pub(crate) fn expand_env(input: &str) -> Result<String, String> {
    let mut failure = None;

    let expanded = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_owned();
            }

            PLACEHOLDER_RE
                .replace_all(line, |caps: &regex::Captures<'_>| {
                    let var = &caps[1];
                    match std::env::var(var) {
                        Ok(value) => value,
                        Err(_) => match caps.get(2) {
                            Some(default) => default.as_str().to_owned(),
                            None => {
                                failure = Some(format!("environment variable not found: `{var}`"));
                                String::new()
                            }
                        },
                    }
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n");

    match failure {
        Some(message) => Err(message),
        None if input.ends_with('\n') => Ok(expanded + "\n"),
        None => Ok(expanded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_plain_toml() {
        let input = "key = \"value\"";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn expands_set_variable() {
        temp_env::with_var("PRISM_TEST_EXPAND", Some("hunter2"), || {
            let out = expand_env("api_key = \"{{ env.PRISM_TEST_EXPAND }}\"").unwrap();
            assert_eq!(out, "api_key = \"hunter2\"");
        });
    }

    #[test]
    fn uses_default_when_unset() {
        let out = expand_env("url = \"{{ env.PRISM_TEST_MISSING | default(\"http://localhost\") }}\"").unwrap();
        assert_eq!(out, "url = \"http://localhost\"");
    }

    #[test]
    fn unset_without_default_is_an_error() {
        let err = expand_env("key = \"{{ env.PRISM_TEST_ALSO_MISSING }}\"").unwrap_err();
        assert!(err.contains("PRISM_TEST_ALSO_MISSING"));
    }

    #[test]
    fn skips_comment_lines() {
        let input = "# {{ env.NOT_A_VAR }}\nkey = \"v\"";
        assert_eq!(expand_env(input).unwrap(), input);
    }
}
