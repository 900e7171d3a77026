// src/utils/tickers.rs
use once_cell::sync::Lazy;
use regex::Regex;

static ALPHABETIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]+$").expect("Failed to compile ALPHABETIC_RE")
});

/// Sanitizes a raw ticker list: trims whitespace, drops share-class suffixes
/// after a dot (BRK.B -> BRK), keeps only purely alphabetic symbols,
/// uppercases, dedupes and sorts.
pub fn sanitize_tickers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tickers: Vec<String> = raw
        .into_iter()
        .filter_map(|line| {
            let symbol = line.as_ref().trim();
            let symbol = symbol.split('.').next().unwrap_or(symbol);
            if symbol.is_empty() || !ALPHABETIC_RE.is_match(symbol) {
                return None;
            }
            Some(symbol.to_uppercase())
        })
        .collect();
    tickers.sort();
    tickers.dedup();
    tickers
}
