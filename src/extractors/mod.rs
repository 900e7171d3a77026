// src/extractors/mod.rs
pub mod compensation;
pub mod images;
pub mod pattern;
pub mod tables;
pub mod text;

// Re-export key extraction types for convenience
pub use compensation::{CompensationExtractor, Document, Extraction};
