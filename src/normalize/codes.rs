//! Code-list normalization for request parameters

/// Expand comma-joined entries into a flat list.
///
/// Each part is trimmed and empty parts are dropped. Order and duplicates
/// are preserved.
pub fn expand_comma_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.as_ref().split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand and upper-case CPT codes
pub fn normalize_cpt_codes<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    expand_comma_list(items)
        .into_iter()
        .map(|code| code.to_uppercase())
        .collect()
}
