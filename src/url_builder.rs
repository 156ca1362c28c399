//! Listing and detail URLs for the source site.
//!
//! The site splits listings into separate path families rather than one
//! query-string endpoint, so the family is chosen from which parameters are
//! present:
//!
//! | present                       | path                               |
//! |-------------------------------|------------------------------------|
//! | nothing                       | `/jobs/in-Indonesia`               |
//! | location                      | `/jobs/in-{loc}`                   |
//! | classification (+ location)   | `/jobs-in-{class}[/in-{loc}]`      |
//! | keyword or tag (+ location)   | `/{kw}-jobs[/in-{loc}]`            |
//!
//! `page` > 1 adds `?page=N`; a keyword on the classification family rides
//! along as `?q=`.

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::text::{normalize, slugify};

pub const DEFAULT_BASE_URL: &str = "https://id.jobstreet.com/id";

const DEFAULT_LISTING_PATH: &str = "jobs/in-Indonesia";

/// Administrative prefixes dropped before slugging a location, matched as
/// whole leading words after normalization. Longer phrases come first.
const ADMIN_PREFIXES: &[&str] = &[
    "special capital region of",
    "special region of",
    "daerah khusus ibukota",
    "daerah istimewa",
    "province of",
    "provinsi",
    "dki",
    "di",
];

/// Optional inputs for a listing URL. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub classification: Option<String>,
    pub tag: Option<String>,
    pub page: Option<u32>,
}

impl ListingQuery {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl UrlBuilder {
    /// `base` is the locale root of the site, e.g. `https://id.jobstreet.com/id`.
    pub fn new(base: &str) -> Result<Self> {
        let parsed = Url::parse(base).map_err(|e| Error::invalid("base_url", e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::invalid("base_url", "not a hierarchical URL"));
        }
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn listing_url(&self, query: &ListingQuery) -> Result<Url> {
        let location = match non_blank(&query.location) {
            Some(raw) => Some(location_slug(raw)?),
            None => None,
        };
        let classification = non_blank(&query.classification)
            .map(slugify)
            .filter(|s| !s.is_empty());
        let keyword = non_blank(&query.keyword)
            .map(slugify)
            .filter(|s| !s.is_empty());
        let tag = non_blank(&query.tag)
            .map(slugify)
            .filter(|s| !s.is_empty());

        let mut query_keyword = None;
        let mut path = match (&classification, keyword.as_ref().or(tag.as_ref())) {
            (Some(class), _) => {
                query_keyword = non_blank(&query.keyword).map(str::to_string);
                format!("jobs-in-{class}")
            }
            (None, Some(kw)) => format!("{kw}-jobs"),
            (None, None) => match &location {
                Some(_) => "jobs".to_string(),
                None => DEFAULT_LISTING_PATH.to_string(),
            },
        };
        if let Some(loc) = &location {
            path.push_str("/in-");
            path.push_str(loc);
        }

        let mut url = self.join(&path)?;
        let page = query.page.unwrap_or(1);
        if query_keyword.is_some() || page > 1 {
            let mut pairs = url.query_pairs_mut();
            if let Some(q) = &query_keyword {
                pairs.append_pair("q", q.trim());
            }
            if page > 1 {
                pairs.append_pair("page", &page.to_string());
            }
        }
        Ok(url)
    }

    pub fn detail_url(&self, job_id: &str) -> Result<Url> {
        self.join(&format!("job/{job_id}"))
    }

    fn join(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base, path))
            .map_err(|e| Error::invalid("url", e.to_string()))
    }
}

/// Shorthand over the default site root.
pub fn build_listing_url(query: &ListingQuery) -> Result<Url> {
    UrlBuilder::default().listing_url(query)
}

/// Slug for the `in-{loc}` segment, administrative prefixes removed.
pub fn location_slug(raw: &str) -> Result<String> {
    let mut text = normalize(raw);
    'strip: loop {
        for prefix in ADMIN_PREFIXES {
            if text == *prefix {
                text.clear();
                break 'strip;
            }
            if let Some(rest) = text
                .strip_prefix(prefix)
                .and_then(|r| r.strip_prefix(' '))
            {
                text = rest.to_string();
                continue 'strip;
            }
        }
        break;
    }
    let slug = slugify(&text);
    if slug.is_empty() {
        return Err(Error::InvalidLocation {
            input: raw.to_string(),
        });
    }
    Ok(slug)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn q() -> ListingQuery {
        ListingQuery::default()
    }

    #[test]
    fn no_params_gives_default_listing() {
        let url = build_listing_url(&q()).unwrap();
        assert_eq!(url.as_str(), "https://id.jobstreet.com/id/jobs/in-Indonesia");
    }

    #[test]
    fn location_is_slugged_into_path() {
        let url = build_listing_url(&ListingQuery {
            location: Some("Jawa Tengah".into()),
            ..q()
        })
        .unwrap();
        assert_eq!(url.path(), "/id/jobs/in-jawa-tengah");
        assert!(url.query().is_none());
    }

    #[test]
    fn administrative_prefix_is_stripped() {
        let url = build_listing_url(&ListingQuery {
            location: Some("DI Yogyakarta".into()),
            ..q()
        })
        .unwrap();
        assert_eq!(url.path_segments().unwrap().last(), Some("in-yogyakarta"));

        assert_eq!(location_slug("Special Region of Yogyakarta").unwrap(), "yogyakarta");
        assert_eq!(location_slug("DKI Jakarta").unwrap(), "jakarta");
        assert_eq!(location_slug("Daerah Istimewa Aceh").unwrap(), "aceh");
        // "di" only counts as a whole leading word
        assert_eq!(location_slug("Dili").unwrap(), "dili");
    }

    #[test]
    fn classification_with_location_switches_family() {
        let url = build_listing_url(&ListingQuery {
            location: Some("Banten".into()),
            classification: Some("Information Technology".into()),
            page: Some(2),
            ..q()
        })
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://id.jobstreet.com/id/jobs-in-information-technology/in-banten?page=2"
        );
    }

    #[test]
    fn keyword_and_tag_families() {
        let url = build_listing_url(&ListingQuery {
            keyword: Some("Rust Developer".into()),
            location: Some("Jakarta".into()),
            ..q()
        })
        .unwrap();
        assert_eq!(url.path(), "/id/rust-developer-jobs/in-jakarta");

        let url = build_listing_url(&ListingQuery::tag("terbaru")).unwrap();
        assert_eq!(url.path(), "/id/terbaru-jobs");

        let url = build_listing_url(&ListingQuery {
            keyword: Some("akuntan".into()),
            classification: Some("accounting".into()),
            ..q()
        })
        .unwrap();
        assert_eq!(url.as_str(), "https://id.jobstreet.com/id/jobs-in-accounting?q=akuntan");
    }

    #[test]
    fn first_page_and_blank_params_are_omitted() {
        let url = build_listing_url(&ListingQuery {
            keyword: Some("   ".into()),
            classification: Some("".into()),
            page: Some(1),
            ..q()
        })
        .unwrap();
        assert_eq!(url.as_str(), "https://id.jobstreet.com/id/jobs/in-Indonesia");
    }

    #[test]
    fn unsluggable_location_is_rejected() {
        for bad in ["!!!", "DI", "special region of", "—"] {
            let err = build_listing_url(&ListingQuery {
                location: Some(bad.into()),
                ..q()
            })
            .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidLocation, "input {bad:?}");
        }
    }

    #[test]
    fn location_urls_are_lowercase_without_spaces() {
        for input in ["Jakarta Selatan", "  KALIMANTAN   Timur ", "Bandung", "Tangerang Selatan"] {
            let url = build_listing_url(&ListingQuery {
                location: Some(input.into()),
                ..q()
            })
            .unwrap();
            let path = url.path();
            assert!(url.as_str().starts_with("https://"));
            assert!(!path.contains(' ') && !path.contains("%20"));
            assert_eq!(path, path.to_lowercase());
        }
    }

    #[test]
    fn custom_base_and_detail_url() {
        let builder = UrlBuilder::new("http://127.0.0.1:9999/id/").unwrap();
        assert_eq!(
            builder.detail_url("89023836").unwrap().as_str(),
            "http://127.0.0.1:9999/id/job/89023836"
        );
        assert!(UrlBuilder::new("not a url").is_err());
    }
}
