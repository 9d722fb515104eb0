use strsim::normalized_levenshtein;

const TITLES: &[&str] = &["mr.", "ms.", "mrs.", "dr.", "prof."];

const NAME_MATCH_THRESHOLD: f64 = 0.82;

/// Lowercases, strips honorific titles and removes all whitespace, so
/// "Dr. Anna  Eriksson" and "ANNA ERIKSSON" compare equal.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = name.to_lowercase();
    for title in TITLES {
        normalized = normalized.replace(title, "");
    }
    normalized.split_whitespace().collect()
}

/// Fuzzy name match tolerant of honorifics, spacing and minor OCR
/// errors: exact after normalization, then containment (shorthand
/// names), then normalized edit similarity.
pub fn names_match(name1: &str, name2: &str) -> bool {
    if name1.is_empty() || name2.is_empty() {
        return false;
    }

    let n1 = normalize_name(name1);
    let n2 = normalize_name(name2);
    if n1.is_empty() || n2.is_empty() {
        return false;
    }

    if n1 == n2 {
        return true;
    }
    if n1.contains(&n2) || n2.contains(&n1) {
        return true;
    }

    normalized_levenshtein(&n1, &n2) >= NAME_MATCH_THRESHOLD
}
