//! Small text helpers shared by config, sync and the CLI.

/// Trim `value`; blank or missing text becomes `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Whether `value` uses the `http` or `https` scheme
pub fn is_http_url(value: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

/// Response bodies quoted in error messages are cut to this many characters
const MAX_QUOTED_BODY: usize = 180;

pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(MAX_QUOTED_BODY).collect()
}

/// Lowercase and strip the Portuguese diacritics found in sheet headers.
pub fn fold_header(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
