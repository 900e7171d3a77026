// src/main.rs
mod edgar;
mod extractors;
mod storage;
mod utils;

use clap::Parser;

use edgar::client::EdgarClient;
use extractors::images::{HttpImageFetcher, TesseractOcr};
use extractors::{CompensationExtractor, Document};
use storage::{ExtractionRecord, FilingStore, ResultsWriter};
use utils::AppError;

/// Command Line Interface for the DEF 14A performance-based compensation extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol of the company
    #[arg(short, long, conflicts_with = "tickers_file")]
    ticker: Option<String>,

    /// Plain-text file with one ticker per line (sanitized before use)
    #[arg(long)]
    tickers_file: Option<String>,

    /// Start year for the DEF 14A filings (optional)
    #[arg(long)]
    start_year: Option<u32>,

    /// End year for the DEF 14A filings (optional)
    #[arg(long)]
    end_year: Option<u32>,

    /// Directory where downloaded filings are cached
    #[arg(long, default_value = "./filings")]
    cache_dir: String,

    /// Output file for extraction records (JSON lines, appended)
    #[arg(short, long, default_value = "./compensation.jsonl")]
    output: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    let tickers = resolve_tickers(&args)?;
    if tickers.is_empty() {
        return Err(AppError::Config("No valid tickers to process".to_string()));
    }

    // 3. Initialize storage and collaborators
    let store = FilingStore::new(&args.cache_dir)?;
    let writer = ResultsWriter::new(&args.output)?;
    let client = EdgarClient::new()?;

    // 4. Initialize the extraction pipeline
    let fetcher = HttpImageFetcher::new()
        .map_err(|e| AppError::Config(format!("Failed to build image fetch client: {}", e)))?;
    let extractor = CompensationExtractor::new(fetcher, TesseractOcr::new());

    // 5. Process each ticker's proxy filings
    let mut record_count = 0;
    let mut failure_count = 0;

    for ticker in &tickers {
        tracing::info!("Finding DEF 14A filings for ticker: {}", ticker);
        let filings = match client
            .find_def14a_filings(ticker, args.start_year, args.end_year)
            .await
        {
            Ok(filings) => filings,
            Err(e) => {
                tracing::error!("Filing search failed for {}: {}", ticker, e);
                failure_count += 1;
                continue;
            }
        };
        tracing::info!("Found {} DEF 14A filings for {}", filings.len(), ticker);

        for filing in filings {
            tracing::info!(
                "Processing filing {} filed {} for year {:?}",
                filing.accession_number,
                filing.filing_date,
                filing.year
            );

            let url = filing.primary_doc_url();
            let (content, encoding_hint) = match store.load(&filing.primary_doc) {
                Some(cached) => {
                    tracing::debug!("Using cached filing {}", filing.primary_doc);
                    cached
                }
                None => match client.download_filing_doc(&url).await {
                    Ok((content, charset)) => {
                        if let Err(e) =
                            store.save(&filing.primary_doc, &content, charset.as_deref())
                        {
                            tracing::warn!("Failed to cache filing {}: {}", filing.primary_doc, e);
                        }
                        (content, charset)
                    }
                    Err(e) => {
                        tracing::error!("Failed to download filing document: {}", e);
                        failure_count += 1;
                        continue;
                    }
                },
            };

            let mut document = Document::new(url, content);
            if let Some(hint) = encoding_hint {
                document = document.with_encoding_hint(hint);
            }

            let result = extractor.extract(&document).await;
            tracing::info!(
                "Extraction result for {} {:?}: {:?}",
                ticker,
                filing.year,
                result
            );

            let record = ExtractionRecord {
                ticker,
                company_name: &filing.company_name,
                year: filing.year,
                document_id: &document.id,
                result,
            };
            match writer.append(&record) {
                Ok(()) => record_count += 1,
                Err(e) => {
                    tracing::error!("Failed to append record for {}: {}", document.id, e);
                    failure_count += 1;
                }
            }
        }
    }

    tracing::info!(
        "Processing finished. Records: {}, Failures: {}",
        record_count,
        failure_count
    );

    if record_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!(
            "Failed to process any filings ({} failures)",
            failure_count
        )));
    }

    Ok(())
}

fn resolve_tickers(args: &Args) -> Result<Vec<String>, AppError> {
    if let Some(path) = &args.tickers_file {
        let raw = std::fs::read_to_string(path)?;
        return Ok(utils::tickers::sanitize_tickers(raw.lines()));
    }
    if let Some(ticker) = &args.ticker {
        return Ok(utils::tickers::sanitize_tickers([ticker.as_str()]));
    }
    Err(AppError::Config(
        "Provide --ticker or --tickers-file".to_string(),
    ))
}
