// src/storage/mod.rs
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::extractors::Extraction;
use crate::utils::error::StorageError;

/// On-disk cache of downloaded filing documents. Re-runs skip documents
/// already present.
pub struct FilingStore {
    base_dir: PathBuf,
}

impl FilingStore {
    /// Creates a new FilingStore rooted at the specified directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Returns the cached bytes and charset hint for a document name, if
    /// present. The hint sidecar keeps decoding policy identical whether a
    /// document came from the cache or a live download.
    pub fn load(&self, filename: &str) -> Option<(Vec<u8>, Option<String>)> {
        let content = fs::read(self.base_dir.join(filename)).ok()?;
        let charset = fs::read_to_string(self.charset_path(filename))
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        Some((content, charset))
    }

    /// Writes a downloaded document into the cache, with the charset the
    /// server declared for it, if any.
    pub fn save(
        &self,
        filename: &str,
        content: &[u8],
        charset: Option<&str>,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(filename);
        fs::write(&file_path, content).map_err(StorageError::IoError)?;
        if let Some(charset) = charset {
            fs::write(self.charset_path(filename), charset).map_err(StorageError::IoError)?;
        }
        tracing::debug!("Cached filing at {}", file_path.display());
        Ok(file_path)
    }

    fn charset_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(format!("{}.charset", filename))
    }
}

/// One immutable record per processed document.
pub struct ExtractionRecord<'a> {
    pub ticker: &'a str,
    pub company_name: &'a str,
    pub year: Option<u32>,
    pub document_id: &'a str,
    pub result: Extraction,
}

/// Appends extraction records to a JSON-lines file. Accumulation across
/// documents lives here, never in the extraction core.
pub struct ResultsWriter {
    path: PathBuf,
}

impl ResultsWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }

        Ok(Self { path })
    }

    /// Appends exactly one line for one document.
    pub fn append(&self, record: &ExtractionRecord) -> Result<(), StorageError> {
        let json = serde_json::json!({
            "ticker": record.ticker,
            "company_name": record.company_name,
            "year": record.year,
            "document": record.document_id,
            "performance_based_compensation": record.result.value(),
            "extracted_at": chrono::Utc::now().to_rfc3339(),
        });

        let line = serde_json::to_string(&json)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(StorageError::IoError)?;
        writeln!(file, "{}", line).map_err(StorageError::IoError)?;

        Ok(())
    }
}
