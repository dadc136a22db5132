/// Case-insensitive substring match used by both search boxes
pub fn matches_term(label: &str, term: &str) -> bool {
    label.to_lowercase().contains(&term.to_lowercase())
}

/// Names from `source` that contain `term`, in source order
pub fn filter_names(source: &[String], term: &str) -> Vec<String> {
    source
        .iter()
        .filter(|name| matches_term(name, term))
        .cloned()
        .collect()
}
