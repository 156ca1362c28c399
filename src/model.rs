use serde::Serialize;

pub const UNKNOWN_COMPANY: &str = "Perusahaan Rahasia";
pub const DEFAULT_LOCATION: &str = "Indonesia";
pub const UNKNOWN_POSTED: &str = "N/A";
pub const DEFAULT_SNIPPET: &str = "Klik link untuk melihat detail lengkap pekerjaan ini";

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    #[serde(rename = "JobStreet Indonesia")]
    Live,
    #[serde(rename = "Sample Data (Scraping Failed)")]
    Sample,
}

/// One listing card, extracted once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub classification: Option<String>,
    pub salary_range: Option<String>,
    pub posted_label: String,
    pub job_type: Option<String>,
    pub detail_url: String,
    pub description_snippet: String,
    pub source: Source,
}

impl JobRecord {
    /// The id when the href carried one, the detail URL otherwise.
    pub fn dedup_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.detail_url)
    }
}

/// One scraped page of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub records: Vec<JobRecord>,
    /// Approximate: set when the page held at least `limit` job anchors.
    /// The site gives no authoritative total in this mode.
    pub has_next_page: bool,
}

/// Result of a listing scrape, tagged so fallback data can never pass for
/// live data.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Live(ListingPage),
    Fallback(ListingPage),
}

impl ScrapeOutcome {
    pub fn page(&self) -> &ListingPage {
        match self {
            Self::Live(p) | Self::Fallback(p) => p,
        }
    }

    pub fn into_page(self) -> ListingPage {
        match self {
            Self::Live(p) | Self::Fallback(p) => p,
        }
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.page().records
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Provenance label for response metadata.
    pub fn provenance(&self) -> &'static str {
        match self {
            Self::Live(_) => "live",
            Self::Fallback(_) => "fallback",
        }
    }
}

/// Full detail page for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub posted_label: String,
    pub description: Vec<String>,
    pub requirements: Vec<String>,
    pub apply_url: String,
}

/// Fixed records served when a scrape yields nothing usable.
pub fn sample_records(listing_url: &str) -> Vec<JobRecord> {
    let sample = |id: &str,
                  title: &str,
                  company: &str,
                  location: &str,
                  job_type: &str,
                  salary: Option<&str>,
                  posted: &str| JobRecord {
        id: Some(id.to_string()),
        title: title.to_string(),
        company: company.to_string(),
        location: location.to_string(),
        classification: None,
        salary_range: salary.map(str::to_string),
        posted_label: posted.to_string(),
        job_type: Some(job_type.to_string()),
        detail_url: listing_url.to_string(),
        description_snippet: DEFAULT_SNIPPET.to_string(),
        source: Source::Sample,
    };
    vec![
        sample(
            "sample_1",
            "Store Leader (Jabodetabek)",
            "Prima Audio Indonesia",
            "Jakarta Raya",
            "Full time",
            None,
            "10 hari yang lalu",
        ),
        sample(
            "sample_2",
            "Sales Analyst",
            "Superior Prima Sukses",
            "Jawa Timur",
            "Full time",
            None,
            "4 jam yang lalu",
        ),
        sample(
            "sample_3",
            "Digital Marketing Staff",
            "Selaras Citra Nusantara Perkasa",
            "Jakarta Selatan",
            "Kontrak",
            Some("Rp 5.000.000 – Rp 5.750.000 per month"),
            "5 hari yang lalu",
        ),
    ]
}
