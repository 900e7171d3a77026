// src/extractors/images.rs

// --- Imports ---
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::utils::error::{FetchError, OcrError};

// --- Constants ---
// One unresponsive host must not stall the whole document.
const IMAGE_FETCH_TIMEOUT_SECS: u64 = 30;

// --- CSS Selectors (Lazy Static) ---
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img").expect("Failed to compile IMG_SELECTOR")
});

/// Enumerates embedded image references in document order. Image elements
/// without a resolvable src attribute are skipped.
pub fn list_image_refs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_owned)
        .collect()
}

/// Capability to retrieve the raw bytes behind an image reference.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, image_ref: &str) -> Result<Vec<u8>, FetchError>;
}

/// Capability to recognize text in raw image bytes.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// reqwest-backed fetcher with a bounded per-request timeout.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IMAGE_FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, image_ref: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(image_ref).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Tesseract-backed OCR engine. Raster bytes are decoded and re-encoded as
/// PNG in memory so Tesseract always sees a format it understands.
pub struct TesseractOcr {
    languages: String,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self {
            languages: "eng".to_string(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| OcrError::ImageDecode(e.to_string()))?;

        let mut png_data = Vec::new();
        decoded
            .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageDecode(e.to_string()))?;

        let mut tess = leptess::LepTess::new(None, &self.languages)
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        tess.set_image_from_mem(&png_data)
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        tess.get_utf8_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_refs_in_document_order() {
        let html = r#"<html><body>
            <img src="first.png"/>
            <p>text</p>
            <img src="https://example.com/second.gif"/>
        </body></html>"#;
        let refs = list_image_refs(html);
        assert_eq!(refs, vec!["first.png", "https://example.com/second.gif"]);
    }

    #[test]
    fn test_srcless_images_skipped() {
        let html = r#"<body><img alt="no source"/><img src="chart.png"/></body>"#;
        assert_eq!(list_image_refs(html), vec!["chart.png"]);
    }

    #[test]
    fn test_tesseract_rejects_invalid_image_bytes() {
        let engine = TesseractOcr::new();
        let result = engine.recognize(b"not an image");
        assert!(matches!(result, Err(OcrError::ImageDecode(_))));
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/chart.png")
            .with_status(200)
            .with_body("png-bytes")
            .create_async()
            .await;

        let fetcher = HttpImageFetcher::new().unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/chart.png", server.url()))
            .await
            .unwrap();
        assert_eq!(bytes, b"png-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetcher_reports_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpImageFetcher::new().unwrap();
        let result = fetcher
            .fetch(&format!("{}/missing.png", server.url()))
            .await;
        assert!(matches!(result, Err(FetchError::Http(status)) if status.as_u16() == 404));
    }
}
