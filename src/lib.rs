//! Job-listing scraper for JobStreet Indonesia.
//!
//! Listing pages are fetched on request, each job card is pulled apart by
//! ordered selector/regex fallback chains, and the records are served as
//! JSON behind a small TTL cache.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod conf;
pub mod detail;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod logging;
pub mod model;
pub mod scrape;
pub mod service;
pub mod text;
pub mod url_builder;

pub use error::{Error, ErrorKind, Result};
pub use model::{JobDetail, JobRecord, ListingPage, ScrapeOutcome, Source};
pub use scrape::{ListingScraper, ScrapeOptions};
pub use service::{FailurePolicy, JobService};
pub use url_builder::{ListingQuery, UrlBuilder, build_listing_url};
