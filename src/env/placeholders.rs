use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::env::EnvMap;

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid regex"));

/// Replaces every `{{key}}` whose key is present in `vars`.
///
/// Unknown placeholders are kept verbatim. Substituted values are never
/// scanned again, so a value containing `{{other}}` is inserted literally.
pub fn interpolate(text: &str, vars: &EnvMap) -> String {
    if vars.is_empty() || !text.contains("{{") {
        return text.to_string();
    }

    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
