// src/extractors/pattern.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

// --- Constants ---
/// Tokens kept on each side of a trigger match when building a context window.
pub const WINDOW_RADIUS: usize = 10;
/// A percentage must strictly exceed this magnitude to qualify.
pub const MIN_PERCENT: f64 = 10.0;

// --- Regex Patterns (Lazy Static) ---
// Trigger phrase anchored at the start of a token; accepts both the
// hyphenated and the space-separated compound form.
static TRIGGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^performance[- ]based").expect("Failed to compile TRIGGER_RE")
});

// One or two digits, optional one-or-two-digit decimal part, percent sign.
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}(?:\.\d{1,2})?)%").expect("Failed to compile PERCENT_RE")
});

// Disambiguating keywords; whole-word, case-insensitive. Shared by all
// three strategies.
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(compensation|vested|earned|target|threshold|goal|award)\b")
        .expect("Failed to compile KEYWORD_RE")
});

/// Scans a token sequence for qualifying percentage values.
///
/// For every token starting with the trigger phrase, a context window of
/// `WINDOW_RADIUS` tokens on each side (clipped at sequence boundaries) is
/// searched for embedded percentages. A percentage qualifies only if the
/// window as a whole contains a disambiguating keyword and the value exceeds
/// `MIN_PERCENT`. All qualifying values are returned, without deduplication;
/// reduction to a single maximum happens once per document in the
/// orchestrator.
pub fn find_candidates<S: AsRef<str>>(tokens: &[S]) -> Vec<f64> {
    let mut candidates = Vec::new();

    for index in 0..tokens.len() {
        if !TRIGGER_RE.is_match(tokens[index].as_ref()) {
            continue;
        }

        let start = index.saturating_sub(WINDOW_RADIUS);
        let end = (index + WINDOW_RADIUS + 1).min(tokens.len());
        let window = &tokens[start..end];
        let context = window
            .iter()
            .map(|t| t.as_ref())
            .collect::<Vec<_>>()
            .join(" ");

        for token in window {
            if let Some(value) = percent_value(token.as_ref()) {
                if KEYWORD_RE.is_match(&context) && value > MIN_PERCENT {
                    tracing::trace!("Accepted candidate {} in window '{}'", value, context);
                    candidates.push(value);
                }
            }
        }
    }

    candidates
}

/// Table-cell variant: the cell text itself is the keyword context, and no
/// trigger phrase is required since cells are already semantically scoped.
pub fn find_cell_candidates(cell: &str) -> Vec<f64> {
    if !KEYWORD_RE.is_match(cell) {
        return Vec::new();
    }

    cell.split_whitespace()
        .filter_map(percent_value)
        .filter(|value| *value > MIN_PERCENT)
        .collect()
}

/// Parses the first embedded percentage in a token, converting the raw match
/// to a typed value right at the matcher boundary.
fn percent_value(token: &str) -> Option<f64> {
    PERCENT_RE
        .captures(token)
        .and_then(|caps| caps[1].parse().ok())
}
