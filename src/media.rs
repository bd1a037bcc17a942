//! Display helpers for server-provided strings

/// Storage prefix the backend emits when it runs with a development host
pub const DEV_STORAGE_PREFIX: &str = "http://localhost/storage/";

/// Rewrites development storage URLs onto the public media host.
///
/// Only a leading `http://localhost/storage/` is replaced; every other URL
/// is returned unchanged.
pub fn clean_media_url(url: &str, media_url: &str) -> String {
    match url.strip_prefix(DEV_STORAGE_PREFIX) {
        Some(rest) => format!("{}/storage/{}", media_url.trim_end_matches('/'), rest),
        None => url.to_string(),
    }
}

/// `near_miss` -> `Near Miss`
pub fn format_incident_type(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
