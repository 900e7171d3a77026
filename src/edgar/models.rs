// src/edgar/models.rs
use serde::{Deserialize, Serialize};

/// Subset of the EDGAR company submission index needed for the filing search.
/// Example: https://data.sec.gov/submissions/CIK0000320193.json
#[derive(Debug, Deserialize)]
pub struct CompanySubmission {
    pub name: String,
    pub filings: Filings,
}

#[derive(Debug, Deserialize)]
pub struct Filings {
    pub recent: FilingsList,
    /// Older history beyond the ~1000-filing `recent` window, split across
    /// separately fetched index pages.
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

/// Pointer to one paginated page of older filing history.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingFile {
    pub name: String,
    pub filing_from: String,
    pub filing_to: String,
}

/// Column-oriented filing history: index i across the vectors describes one
/// filing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsList {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    pub form: Vec<String>,
    pub primary_document: Vec<String>,
}

/// One DEF 14A proxy filing selected for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingInfo {
    pub accession_number: String,
    pub filing_date: String,
    pub form_type: String,
    pub ticker: String,
    pub company_name: String,
    pub cik: String,
    pub primary_doc: String,
    pub year: Option<u32>, // Calendar year the proxy was filed
}

impl FilingInfo {
    /// Constructs the URL to access the primary document of this filing
    pub fn primary_doc_url(&self) -> String {
        let acc_no_dashes = self.accession_number.replace('-', "");
        format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}/{}",
            self.cik, acc_no_dashes, self.primary_doc
        )
    }
}
