// src/edgar/client.rs
use std::time::Duration;

use reqwest::header;

use crate::edgar::models::{CompanySubmission, FilingFile, FilingInfo, FilingsList};
use crate::utils::error::EdgarError;

// SEC requires a descriptive User-Agent carrying a contact address.
const EDGAR_USER_AGENT: &str = "def14a_extractor research tool contact@example.com";
// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
const EDGAR_REQUEST_DELAY_MS: u64 = 150;
const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

/// Client for EDGAR filing discovery and document download. One instance is
/// shared for a whole run so connection pooling and throttling apply across
/// requests.
pub struct EdgarClient {
    http: reqwest::Client,
}

impl EdgarClient {
    pub fn new() -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(EDGAR_USER_AGENT)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http })
    }

    async fn throttle(&self) {
        tokio::time::sleep(Duration::from_millis(EDGAR_REQUEST_DELAY_MS)).await;
    }

    /// Gets the zero-padded CIK (Central Index Key) for a ticker symbol.
    pub async fn cik_for_ticker(&self, ticker: &str) -> Result<String, EdgarError> {
        let ticker = ticker.to_uppercase();
        let url = "https://www.sec.gov/files/company_tickers.json";

        self.throttle().await;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(EdgarError::Http(response.status()));
        }

        let json: serde_json::Value = response.json().await?;
        let companies = json
            .as_object()
            .ok_or_else(|| EdgarError::Parse("Invalid company ticker index".to_string()))?;

        for company in companies.values() {
            let matches = company
                .get("ticker")
                .and_then(|t| t.as_str())
                .map(|t| t.eq_ignore_ascii_case(&ticker))
                .unwrap_or(false);
            if matches {
                let cik = company
                    .get("cik_str")
                    .and_then(|c| c.as_u64())
                    .ok_or_else(|| EdgarError::Parse("Invalid CIK format".to_string()))?;
                // CIK with leading zeros to 10 digits
                return Ok(format!("{:010}", cik));
            }
        }

        Err(EdgarError::Parse(format!(
            "Could not find CIK for ticker {}",
            ticker
        )))
    }

    /// Fetches the company submission index for a given CIK.
    pub async fn company_submissions(&self, cik: &str) -> Result<CompanySubmission, EdgarError> {
        let url = format!("https://data.sec.gov/submissions/CIK{}.json", cik);

        self.throttle().await;
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(EdgarError::Http(response.status()));
        }

        let submission: CompanySubmission = response.json().await?;
        Ok(submission)
    }

    /// Fetches one paginated page of older filing history.
    pub async fn filing_index_page(&self, name: &str) -> Result<FilingsList, EdgarError> {
        let url = format!("https://data.sec.gov/submissions/{}", name);

        self.throttle().await;
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(EdgarError::Http(response.status()));
        }

        let page: FilingsList = response.json().await?;
        Ok(page)
    }

    /// Finds DEF 14A proxy filings for a ticker within an optional year range,
    /// newest first. The `recent` window of the submissions index covers only
    /// the newest ~1000 filings, so older index pages are fetched whenever
    /// their date span overlaps the requested range.
    pub async fn find_def14a_filings(
        &self,
        ticker: &str,
        start_year: Option<u32>,
        end_year: Option<u32>,
    ) -> Result<Vec<FilingInfo>, EdgarError> {
        let cik = self.cik_for_ticker(ticker).await?;
        let submissions = self.company_submissions(&cik).await?;

        let mut filings = collect_def14a(
            &submissions.filings.recent,
            ticker,
            &submissions.name,
            &cik,
            start_year,
            end_year,
        )?;

        for page in &submissions.filings.files {
            if !page_overlaps_range(page, start_year, end_year) {
                tracing::debug!(
                    "Skipping index page {} ({}..{}) outside requested range",
                    page.name,
                    page.filing_from,
                    page.filing_to
                );
                continue;
            }
            let older = self.filing_index_page(&page.name).await?;
            filings.extend(collect_def14a(
                &older,
                ticker,
                &submissions.name,
                &cik,
                start_year,
                end_year,
            )?);
        }

        // Newest first
        filings.sort_by(|a, b| b.year.cmp(&a.year));

        Ok(filings)
    }

    /// Downloads a filing document as raw bytes plus the charset declared in
    /// the Content-Type header, if any. Decoding is deferred to the
    /// extraction core, which owns the encoding fallback policy.
    pub async fn download_filing_doc(
        &self,
        url: &str,
    ) -> Result<(Vec<u8>, Option<String>), EdgarError> {
        tracing::info!("Downloading document from: {}", url);

        self.throttle().await;
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/xml,text/html,text/plain,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::FilingDocNotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }

        let charset = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let body = response.bytes().await?.to_vec();
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);

        Ok((body, charset))
    }
}

/// Collects DEF 14A entries from one column-oriented filing list, applying
/// the optional year range.
fn collect_def14a(
    list: &FilingsList,
    ticker: &str,
    company_name: &str,
    cik: &str,
    start_year: Option<u32>,
    end_year: Option<u32>,
) -> Result<Vec<FilingInfo>, EdgarError> {
    let mut filings = Vec::new();

    for i in 0..list.accession_number.len() {
        let form = list
            .form
            .get(i)
            .ok_or_else(|| EdgarError::Parse("Missing form type".to_string()))?;
        if form != "DEF 14A" {
            continue;
        }

        let filing_date = list
            .filing_date
            .get(i)
            .ok_or_else(|| EdgarError::Parse("Missing filing date".to_string()))?;
        // Filing date format: YYYY-MM-DD
        let year = filing_date
            .get(0..4)
            .and_then(|y| y.parse::<u32>().ok())
            .ok_or_else(|| EdgarError::Parse("Invalid date format".to_string()))?;

        if start_year.is_some_and(|s| year < s) || end_year.is_some_and(|e| year > e) {
            continue;
        }

        let primary_doc = list
            .primary_document
            .get(i)
            .ok_or_else(|| EdgarError::Parse("Missing primary document".to_string()))?;

        filings.push(FilingInfo {
            accession_number: list.accession_number[i].clone(),
            filing_date: filing_date.clone(),
            form_type: form.clone(),
            ticker: ticker.to_uppercase(),
            company_name: company_name.to_string(),
            cik: cik.to_string(),
            primary_doc: primary_doc.clone(),
            year: Some(year),
        });
    }

    Ok(filings)
}

/// True when an older index page's date span could hold filings inside the
/// requested year range. A page with unparsable bounds is fetched rather
/// than silently skipped.
fn page_overlaps_range(page: &FilingFile, start_year: Option<u32>, end_year: Option<u32>) -> bool {
    let from = page.filing_from.get(0..4).and_then(|y| y.parse::<u32>().ok());
    let to = page.filing_to.get(0..4).and_then(|y| y.parse::<u32>().ok());
    let (Some(from), Some(to)) = (from, to) else {
        return true;
    };
    start_year.map_or(true, |s| to >= s) && end_year.map_or(true, |e| from <= e)
}

/// Extracts the charset parameter from a Content-Type header value.
fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(val.trim().trim_matches('"').to_ascii_lowercase())
        } else {
            None
        }
    })
}
