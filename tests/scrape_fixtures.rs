use std::collections::HashSet;

use jobclaw::detail::DetailScraper;
use jobclaw::model::{DEFAULT_SNIPPET, UNKNOWN_POSTED};
use jobclaw::{ListingScraper, ScrapeOptions, Source};
use url::Url;

const LISTING: &str = include_str!("fixtures/listing.html");
const EMPTY: &str = include_str!("fixtures/empty.html");
const DETAIL: &str = include_str!("fixtures/detail.html");

fn page_url() -> Url {
    Url::parse("https://id.jobstreet.com/id/jobs/in-Indonesia").unwrap()
}

#[test]
fn every_distinct_job_once_in_document_order() {
    let out = ListingScraper::default().parse(LISTING, &page_url(), ScrapeOptions::default());
    assert!(!out.is_fallback());

    let ids: Vec<&str> = out
        .records()
        .iter()
        .map(|r| r.id.as_deref().unwrap())
        .collect();
    assert_eq!(ids, ["81234567", "81234568", "81234569", "81234570", "81234571"]);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    assert!(!out.page().has_next_page);
    assert!(out.records().iter().all(|r| r.source == Source::Live));
}

#[test]
fn fields_from_a_complete_card() {
    let out = ListingScraper::default().parse(LISTING, &page_url(), ScrapeOptions::default());
    let first = &out.records()[0];
    assert_eq!(first.title, "Senior Backend Engineer");
    assert_eq!(first.company, "PT Maju Jaya Sentosa");
    assert_eq!(first.location, "Jakarta Selatan");
    assert_eq!(
        first.salary_range.as_deref(),
        Some("Rp 12.000.000 – Rp 18.000.000 per month")
    );
    assert_eq!(first.classification.as_deref(), Some("Teknologi Informasi & Komunikasi"));
    assert_eq!(first.job_type.as_deref(), Some("Full time"));
    assert_eq!(first.posted_label, "2 hari yang lalu");
    assert_eq!(first.detail_url, "https://id.jobstreet.com/id/job/81234567");
    assert_eq!(first.description_snippet, DEFAULT_SNIPPET);
}

#[test]
fn fallback_paths_per_field() {
    let out = ListingScraper::default().parse(LISTING, &page_url(), ScrapeOptions::default());
    let records = out.records();

    // no salary on the card: absent, not defaulted
    assert_eq!(records[1].salary_range, None);
    assert_eq!(records[1].location, "Surabaya");
    assert_eq!(records[1].posted_label, "5 jam yang lalu");

    // no title selector: anchor text wins, company from the phrase
    assert_eq!(records[2].title, "Digital Marketing Specialist");
    assert_eq!(records[2].company, "PT Kreasi Digital");
    assert_eq!(records[2].location, "Bandung");
    assert_eq!(records[2].posted_label, "Baru saja");
    assert_eq!(records[2].job_type, None);

    assert_eq!(records[3].posted_label, "30+ hari yang lalu");
    assert_eq!(records[4].posted_label, "Kemarin");
    assert!(records.iter().all(|r| r.posted_label != UNKNOWN_POSTED));
}

#[test]
fn limit_truncates_and_signals_more() {
    let out = ListingScraper::default().parse(LISTING, &page_url(), ScrapeOptions::with_limit(3));
    assert_eq!(out.records().len(), 3);
    assert!(out.page().has_next_page);
}

#[test]
fn page_without_job_anchors_serves_samples() {
    let out = ListingScraper::default().parse(EMPTY, &page_url(), ScrapeOptions::default());
    assert!(out.is_fallback());
    assert_eq!(out.records().len(), 3);
    for record in out.records() {
        assert_eq!(record.source, Source::Sample);
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["source"], "Sample Data (Scraping Failed)");
    }
}

#[test]
fn detail_page_paragraphs_and_requirements() {
    let detail = DetailScraper::default()
        .parse(DETAIL, "81234567", "https://id.jobstreet.com/id/job/81234567")
        .unwrap();
    assert_eq!(detail.title, "Senior Backend Engineer");
    assert_eq!(detail.company, "PT Maju Jaya Sentosa");
    assert_eq!(
        detail.salary.as_deref(),
        Some("Rp 12.000.000 – Rp 18.000.000 per month")
    );
    assert_eq!(detail.job_type.as_deref(), Some("Full time"));
    assert_eq!(detail.posted_label, "Diposting 2 hari yang lalu");
    assert_eq!(detail.description.len(), 2);
    assert!(detail.description.iter().all(|p| !p.contains("cookie")));
    assert_eq!(detail.requirements.len(), 3);
}
