// src/extractors/text.rs

// --- Imports ---
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use scraper::Html;

// Decode fallback order for filing bytes. Windows-1252 decodes every byte
// sequence, so it doubles as the Latin-1 catch-all of last resort.
static FALLBACK_ENCODINGS: &[&Encoding] = &[UTF_8, WINDOWS_1252];

/// Decodes raw document bytes into markup text, trying the declared encoding
/// hint first and then the fixed fallback list. Returns `None` only when
/// every candidate encoding rejects the content; callers treat that as empty
/// input, never as a fatal error.
pub fn decode_html(content: &[u8], encoding_hint: Option<&str>) -> Option<String> {
    let hinted = encoding_hint.and_then(|label| Encoding::for_label(label.as_bytes()));

    for encoding in hinted.into_iter().chain(FALLBACK_ENCODINGS.iter().copied()) {
        let (text, _, had_errors) = encoding.decode(content);
        if !had_errors {
            return Some(text.into_owned());
        }
        tracing::debug!("Decode as {} rejected content, trying next candidate", encoding.name());
    }

    None
}

/// Decodes a document, strips its markup via a DOM parse, and splits the
/// remaining text on whitespace into an ordered token sequence.
pub fn tokenize_document(content: &[u8], encoding_hint: Option<&str>) -> Option<Vec<String>> {
    let html = decode_html(content, encoding_hint)?;
    let document = Html::parse_document(&html);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    Some(text.split_whitespace().map(str::to_owned).collect())
}
