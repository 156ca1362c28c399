use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::extract::{Card, Extractors};
use crate::fetch::FetchClient;
use crate::model::{JobRecord, ListingPage, ScrapeOutcome, Source, sample_records};

pub const DEFAULT_LIMIT: usize = 30;
pub const DEFAULT_PER_PAGE_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub limit: usize,
    pub per_page_max: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            per_page_max: DEFAULT_PER_PAGE_MAX,
        }
    }
}

impl ScrapeOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// `limit` capped by `per_page_max`, never below one.
    pub fn effective_limit(&self) -> usize {
        self.limit.min(self.per_page_max).max(1)
    }
}

/// Walks job anchors on a listing page and turns each card into a record.
pub struct ListingScraper {
    extractors: Extractors,
    job_anchor: Selector,
    listing_item: Selector,
    article: Selector,
    job_id: Regex,
}

impl Default for ListingScraper {
    fn default() -> Self {
        Self::new(Extractors::default())
    }
}

impl ListingScraper {
    pub fn new(extractors: Extractors) -> Self {
        Self {
            extractors,
            job_anchor: Selector::parse(r#"a[href*="/job/"]"#).expect("static selector"),
            listing_item: Selector::parse(r#"[data-automation="jobListing"]"#)
                .expect("static selector"),
            article: Selector::parse("article").expect("static selector"),
            job_id: Regex::new(r"/job/(\d+)").expect("static pattern"),
        }
    }

    pub async fn scrape(
        &self,
        client: &FetchClient,
        url: &Url,
        timeout: Duration,
        opts: ScrapeOptions,
    ) -> Result<ScrapeOutcome> {
        let html = client.fetch_html(url, timeout).await?;
        Ok(self.parse(&html, url, opts))
    }

    /// Records in document order of first occurrence, at most
    /// `opts.effective_limit()` of them. An empty result becomes the sample set.
    pub fn parse(&self, html: &str, page_url: &Url, opts: ScrapeOptions) -> ScrapeOutcome {
        let limit = opts.effective_limit();
        let doc = Html::parse_document(html);

        let mut anchors_seen: HashSet<String> = HashSet::new();
        let mut records: Vec<JobRecord> = Vec::new();
        let mut skipped = 0usize;

        for anchor in doc.select(&self.job_anchor) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(detail_url) = canonical_detail_url(page_url, href) else {
                continue;
            };
            let id = self
                .job_id
                .captures(detail_url.path())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            let key = id.clone().unwrap_or_else(|| detail_url.to_string());
            if !anchors_seen.insert(key) {
                continue;
            }
            if records.len() >= limit {
                continue;
            }

            let card = Card::new(self.card_root(anchor), Some(anchor));
            match self.extractors.extract(&card) {
                Some(fields) => {
                    records.push(JobRecord {
                        id,
                        title: fields.title,
                        company: fields.company,
                        location: fields.location,
                        classification: fields.classification,
                        salary_range: fields.salary_range,
                        posted_label: fields.posted_label,
                        job_type: fields.job_type,
                        detail_url: detail_url.to_string(),
                        description_snippet: fields.description_snippet,
                        source: Source::Live,
                    });
                }
                None => {
                    skipped += 1;
                    debug!(href, "card without usable title skipped");
                }
            }
        }

        // approximate: the page carries no authoritative total
        let has_next_page = anchors_seen.len() >= limit;

        if records.is_empty() {
            warn!(
                url = %page_url,
                anchors = anchors_seen.len(),
                "no records extracted, serving sample set"
            );
            return ScrapeOutcome::Fallback(ListingPage {
                records: sample_records(page_url.as_str()),
                has_next_page: false,
            });
        }

        info!(
            url = %page_url,
            anchors = anchors_seen.len(),
            records = records.len(),
            skipped,
            has_next_page,
            "parsed listing page"
        );
        ScrapeOutcome::Live(ListingPage {
            records,
            has_next_page,
        })
    }

    /// Nearest listing container, then nearest `article`, then two levels up.
    fn card_root<'a>(&self, anchor: ElementRef<'a>) -> ElementRef<'a> {
        let ancestors = || anchor.ancestors().filter_map(ElementRef::wrap);
        ancestors()
            .find(|el| self.listing_item.matches(el))
            .or_else(|| ancestors().find(|el| self.article.matches(el)))
            .or_else(|| ancestors().nth(1))
            .or_else(|| ancestors().next())
            .unwrap_or(anchor)
    }
}

/// Absolute href with query and fragment dropped.
fn canonical_detail_url(page_url: &Url, href: &str) -> Option<Url> {
    let mut url = page_url.join(href).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}
