// src/extractors/compensation.rs

// --- Imports ---
use crate::extractors::images::{list_image_refs, ImageFetcher, OcrEngine};
use crate::extractors::pattern::{find_candidates, find_cell_candidates};
use crate::extractors::tables::extract_tables;
use crate::extractors::text::{decode_html, tokenize_document};

// --- Data Structures ---
/// One document handed to the extraction pipeline: an opaque identifier plus
/// raw content bytes and an optional declared encoding. Immutable once built;
/// the pipeline only reads it.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub content: Vec<u8>,
    pub encoding_hint: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            content,
            encoding_hint: None,
        }
    }

    pub fn with_encoding_hint(mut self, hint: impl Into<String>) -> Self {
        self.encoding_hint = Some(hint.into());
        self
    }
}

/// Terminal outcome of the pipeline for one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extraction {
    /// Maximum qualifying percentage found by the first productive strategy.
    Percentage(f64),
    /// No strategy produced a qualifying candidate.
    NoData,
}

impl Extraction {
    pub fn value(&self) -> Option<f64> {
        match self {
            Extraction::Percentage(v) => Some(*v),
            Extraction::NoData => None,
        }
    }
}

// --- Main Extractor Structure ---
/// Runs the strategy cascade for one document: plain text, then OCR'd
/// images, then tables. Strategies are attempted in that fixed order and a
/// later strategy runs only if every earlier one produced zero qualifying
/// candidates. Holds no per-document state, so one instance serves any
/// number of `extract` calls.
pub struct CompensationExtractor<F, O> {
    fetcher: F,
    ocr: O,
}

impl<F: ImageFetcher, O: OcrEngine> CompensationExtractor<F, O> {
    pub fn new(fetcher: F, ocr: O) -> Self {
        Self { fetcher, ocr }
    }

    /// The sole pipeline entry point. Never fails: malformed markup,
    /// undecodable bytes, unreachable images and OCR errors all degrade to
    /// "this strategy found nothing" and the cascade moves on.
    pub async fn extract(&self, document: &Document) -> Extraction {
        let candidates = self.text_candidates(document);
        if let Some(max) = highest(candidates) {
            tracing::info!("Text strategy matched in {}: {}%", document.id, max);
            return Extraction::Percentage(max);
        }

        let candidates = self.image_candidates(document).await;
        if let Some(max) = highest(candidates) {
            tracing::info!("Image OCR strategy matched in {}: {}%", document.id, max);
            return Extraction::Percentage(max);
        }

        let candidates = self.table_candidates(document);
        if let Some(max) = highest(candidates) {
            tracing::info!("Table strategy matched in {}: {}%", document.id, max);
            return Extraction::Percentage(max);
        }

        tracing::info!("No qualifying percentage found in {}", document.id);
        Extraction::NoData
    }

    /// TEXT state: tokenize the document and scan the token sequence.
    /// An undecodable document is treated as empty input, not an error, so
    /// the cascade still reaches the image and table strategies.
    fn text_candidates(&self, document: &Document) -> Vec<f64> {
        match tokenize_document(&document.content, document.encoding_hint.as_deref()) {
            Some(tokens) => find_candidates(&tokens),
            None => {
                tracing::warn!(
                    "Could not decode {} under any candidate encoding, skipping text strategy",
                    document.id
                );
                Vec::new()
            }
        }
    }

    /// IMAGE state: OCR every embedded image and scan each image's token
    /// sequence independently, pooling candidates across images. A fetch or
    /// recognition failure is terminal for that one image only.
    async fn image_candidates(&self, document: &Document) -> Vec<f64> {
        let Some(html) = decode_html(&document.content, document.encoding_hint.as_deref())
        else {
            return Vec::new();
        };

        let mut pooled = Vec::new();
        for image_ref in list_image_refs(&html) {
            let bytes = match self.fetcher.fetch(&image_ref).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to fetch image {}: {}", image_ref, e);
                    continue;
                }
            };
            let text = match self.ocr.recognize(&bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("OCR failed for image {}: {}", image_ref, e);
                    continue;
                }
            };
            let tokens: Vec<&str> = text.split_whitespace().collect();
            pooled.extend(find_candidates(&tokens));
        }
        pooled
    }

    /// TABLE state: scan every data cell of every table with the
    /// cell-scoped matcher variant, pooling candidates.
    fn table_candidates(&self, document: &Document) -> Vec<f64> {
        let Some(html) = decode_html(&document.content, document.encoding_hint.as_deref())
        else {
            return Vec::new();
        };

        let mut pooled = Vec::new();
        for table in extract_tables(&html) {
            for row in table {
                for cell in row {
                    pooled.extend(find_cell_candidates(&cell));
                }
            }
        }
        pooled
    }
}

fn highest(candidates: Vec<f64>) -> Option<f64> {
    candidates.into_iter().reduce(f64::max)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{FetchError, OcrError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves canned bodies per image ref and counts every fetch call.
    struct MapFetcher {
        bodies: HashMap<String, Vec<u8>>,
        calls: Arc<AtomicUsize>,
    }

    impl MapFetcher {
        fn new(bodies: &[(&str, &str)]) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let fetcher = Self {
                bodies: bodies
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
                calls: Arc::clone(&calls),
            };
            (fetcher, calls)
        }
    }

    #[async_trait]
    impl ImageFetcher for MapFetcher {
        async fn fetch(&self, image_ref: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(image_ref)
                .cloned()
                .ok_or(FetchError::Http(reqwest::StatusCode::NOT_FOUND))
        }
    }

    /// "Recognizes" image bytes by reading them back as UTF-8 text.
    struct PlainTextOcr;

    impl OcrEngine for PlainTextOcr {
        fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
            Ok(String::from_utf8_lossy(image).into_owned())
        }
    }

    fn extractor_with(
        bodies: &[(&str, &str)],
    ) -> (CompensationExtractor<MapFetcher, PlainTextOcr>, Arc<AtomicUsize>) {
        let (fetcher, calls) = MapFetcher::new(bodies);
        (CompensationExtractor::new(fetcher, PlainTextOcr), calls)
    }

    fn doc(html: &str) -> Document {
        Document::new("test.html", html.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_text_strategy_short_circuits_later_strategies() {
        let (extractor, fetch_calls) = extractor_with(&[]);
        let document = doc(
            r#"<p>performance-based compensation of 25% earned</p>
               <img src="chart.png"/>
               <table><tr><td>Earned 99% of target</td></tr></table>"#,
        );

        let result = extractor.extract(&document).await;
        assert_eq!(result, Extraction::Percentage(25.0));
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 0, "image strategy must not run");
    }

    #[tokio::test]
    async fn test_maximum_of_multiple_text_candidates() {
        let (extractor, _) = extractor_with(&[]);
        let document = doc(
            "<p>performance-based compensation target 15% for officers and \
             later the performance-based award paid 22% of salary</p>",
        );

        assert_eq!(extractor.extract(&document).await, Extraction::Percentage(22.0));
    }

    #[tokio::test]
    async fn test_values_at_or_below_threshold_yield_no_data() {
        let (extractor, _) = extractor_with(&[]);
        let document = doc("<p>performance-based compensation of 10% earned</p>");

        assert_eq!(extractor.extract(&document).await, Extraction::NoData);
    }

    #[tokio::test]
    async fn test_image_failure_does_not_abort_siblings() {
        let (extractor, fetch_calls) = extractor_with(&[
            ("a.png", "performance-based award of 30% vested overall"),
            // b.png missing: fetch returns 404
            ("c.png", "performance-based goal reached 45% of target"),
        ]);
        let document = doc(
            r#"<p>no trigger in the body text</p>
               <img src="a.png"/><img src="b.png"/><img src="c.png"/>"#,
        );

        let result = extractor.extract(&document).await;
        assert_eq!(result, Extraction::Percentage(45.0));
        assert_eq!(fetch_calls.load(Ordering::SeqCst), 3, "every image attempted once");
    }

    #[tokio::test]
    async fn test_table_strategy_as_final_fallback() {
        let (extractor, _) = extractor_with(&[]);
        let document = doc(
            r#"<p>nothing relevant in prose</p>
               <table>
                 <tr><th>Metric</th></tr>
                 <tr><td>15% increase</td></tr>
                 <tr><td>Earned 18.5% of target</td></tr>
               </table>"#,
        );

        assert_eq!(extractor.extract(&document).await, Extraction::Percentage(18.5));
    }

    #[tokio::test]
    async fn test_no_trigger_anywhere_yields_no_data() {
        let (extractor, _) = extractor_with(&[("a.png", "quarterly revenue rose 12%")]);
        let document = doc(
            r#"<p>ordinary prose with 45% mentioned</p>
               <img src="a.png"/>
               <table><tr><td>12% margin</td></tr></table>"#,
        );

        assert_eq!(extractor.extract(&document).await, Extraction::NoData);
    }

    #[tokio::test]
    async fn test_extract_is_idempotent_per_document() {
        let (extractor, _) = extractor_with(&[]);
        let document = doc("<p>performance-based compensation of 25% earned</p>");

        let first = extractor.extract(&document).await;
        let second = extractor.extract(&document).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_ocr_failure_treated_as_empty_text() {
        struct FailingOcr;
        impl OcrEngine for FailingOcr {
            fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
                Err(OcrError::Recognition("engine unavailable".to_string()))
            }
        }

        let (fetcher, _) = MapFetcher::new(&[("a.png", "performance-based award 30% vested")]);
        let extractor = CompensationExtractor::new(fetcher, FailingOcr);
        let document = doc(r#"<p>no trigger here</p><img src="a.png"/>"#);

        assert_eq!(extractor.extract(&document).await, Extraction::NoData);
    }
}
