//! Scraping service shared by every HTTP handler.
//!
//! Owns the fetch client, the scrapers and the process-wide caches. Only
//! live results are cached; a fallback sample set is never stored, so the
//! next request retries the site.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::aggregate::{CategoryCount, aggregate, distinct_locations};
use crate::cache::{CacheStats, Clock, SystemClock, TtlCache};
use crate::conf::Settings;
use crate::detail::DetailScraper;
use crate::error::Result;
use crate::fetch::{FetchClient, FetchConfig};
use crate::filter::SearchFilter;
use crate::model::{JobDetail, ListingPage, ScrapeOutcome, sample_records};
use crate::scrape::{ListingScraper, ScrapeOptions};
use crate::url_builder::{ListingQuery, UrlBuilder};

pub const LATEST_TAG: &str = "terbaru";
pub const RECOMMENDATIONS_TAG: &str = "rekomendasi";

/// What to do when the site cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Propagate the error to the caller.
    Strict,
    /// Serve the sample set, tagged as fallback.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub url: Url,
    pub outcome: ScrapeOutcome,
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSummary {
    pub categories: Vec<CategoryCount>,
    pub locations: Vec<String>,
    pub total_jobs_analyzed: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceCacheStats {
    pub listings: CacheStats,
    pub filters: CacheStats,
}

#[derive(Debug, Clone, Copy)]
struct Ttls {
    listing: u64,
    recommendations: u64,
    filters: u64,
}

pub struct JobService {
    urls: UrlBuilder,
    client: FetchClient,
    listing: ListingScraper,
    detail: DetailScraper,
    timeout: Duration,
    ttls: Ttls,
    listings: TtlCache<ListingPage>,
    filters: TtlCache<FilterSummary>,
}

impl JobService {
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = FetchClient::new(FetchConfig {
            respect_robots: settings.respect_robots,
            ..FetchConfig::default()
        })?;
        Ok(Self {
            urls: UrlBuilder::new(&settings.base_url)?,
            client,
            listing: ListingScraper::default(),
            detail: DetailScraper::default(),
            timeout: settings.fetch_timeout(),
            ttls: Ttls {
                listing: settings.listing_ttl_secs,
                recommendations: settings.recommendations_ttl_secs,
                filters: settings.filters_ttl_secs,
            },
            listings: TtlCache::with_clock(clock.clone()),
            filters: TtlCache::with_clock(clock),
        })
    }

    pub fn urls(&self) -> &UrlBuilder {
        &self.urls
    }

    pub fn listing_ttl_secs(&self) -> u64 {
        self.ttls.listing
    }

    pub fn recommendations_ttl_secs(&self) -> u64 {
        self.ttls.recommendations
    }

    pub fn filters_ttl_secs(&self) -> u64 {
        self.ttls.filters
    }

    /// General listing for `query`, cached for the listing TTL.
    pub async fn listing(
        &self,
        query: &ListingQuery,
        opts: ScrapeOptions,
        policy: FailurePolicy,
    ) -> Result<Listing> {
        let url = self.urls.listing_url(query)?;
        self.cached_listing(url, opts, policy, self.ttls.listing).await
    }

    /// The site's newest-first feed.
    pub async fn latest(&self, opts: ScrapeOptions) -> Result<Listing> {
        self.listing(&ListingQuery::tag(LATEST_TAG), opts, FailurePolicy::Strict)
            .await
    }

    /// Recommendation feed, cached for its own, shorter TTL.
    pub async fn recommendations(&self, page: u32, opts: ScrapeOptions) -> Result<Listing> {
        let url = self
            .urls
            .listing_url(&ListingQuery::tag(RECOMMENDATIONS_TAG).with_page(page))?;
        self.cached_listing(url, opts, FailurePolicy::Fallback, self.ttls.recommendations)
            .await
    }

    /// Strict listing with the secondary filters applied afterwards.
    pub async fn search(
        &self,
        query: &ListingQuery,
        filter: &SearchFilter,
        opts: ScrapeOptions,
    ) -> Result<Listing> {
        let mut listing = self.listing(query, opts, FailurePolicy::Strict).await?;
        if !filter.is_noop() {
            listing.outcome = match listing.outcome {
                ScrapeOutcome::Live(page) => ScrapeOutcome::Live(ListingPage {
                    records: filter.apply(page.records),
                    has_next_page: page.has_next_page,
                }),
                fallback => fallback,
            };
        }
        Ok(listing)
    }

    /// Categories and locations seen on the default listing.
    pub async fn filters(&self) -> Result<FilterSummary> {
        const KEY: &str = "filters";
        if let Some(hit) = self.filters.get(KEY) {
            debug!("filters cache hit");
            return Ok(hit);
        }
        let listing = self
            .listing(&ListingQuery::default(), ScrapeOptions::default(), FailurePolicy::Strict)
            .await?;
        let records = listing.outcome.records();
        let summary = FilterSummary {
            categories: aggregate(records),
            locations: distinct_locations(records),
            total_jobs_analyzed: records.len(),
        };
        if !listing.outcome.is_fallback() {
            self.filters.set(KEY, summary.clone(), self.ttls.filters);
        }
        Ok(summary)
    }

    pub async fn detail(&self, job_id: &str) -> Result<JobDetail> {
        self.detail
            .scrape(&self.client, &self.urls, job_id, self.timeout)
            .await
    }

    /// One page, never cached. Used by the page-walking stream.
    pub async fn scrape_page(&self, url: &Url, opts: ScrapeOptions) -> Result<ScrapeOutcome> {
        self.listing.scrape(&self.client, url, self.timeout, opts).await
    }

    pub fn cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats {
            listings: self.listings.stats(),
            filters: self.filters.stats(),
        }
    }

    async fn cached_listing(
        &self,
        url: Url,
        opts: ScrapeOptions,
        policy: FailurePolicy,
        ttl_secs: u64,
    ) -> Result<Listing> {
        let key = format!("{url}#limit={}", opts.effective_limit());
        if let Some(page) = self.listings.get(&key) {
            debug!(%url, "listing cache hit");
            return Ok(Listing {
                url,
                outcome: ScrapeOutcome::Live(page),
                cached: true,
            });
        }

        let outcome = match self.scrape_page(&url, opts).await {
            Ok(outcome) => outcome,
            Err(e) if policy == FailurePolicy::Fallback && !e.kind().is_client_error() => {
                warn!(%url, error = %e, "fetch failed, serving sample set");
                ScrapeOutcome::Fallback(ListingPage {
                    records: sample_records(url.as_str()),
                    has_next_page: false,
                })
            }
            Err(e) => return Err(e),
        };

        if let ScrapeOutcome::Live(page) = &outcome {
            self.listings.set(key, page.clone(), ttl_secs);
            info!(%url, records = page.records.len(), ttl_secs, "listing cached");
        }
        Ok(Listing {
            url,
            outcome,
            cached: false,
        })
    }
}
