//! Single job detail page.
//!
//! Unlike listing cards, the detail view returns full description paragraphs.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetch::FetchClient;
use crate::model::{JobDetail, UNKNOWN_POSTED};
use crate::text::clean_text;
use crate::url_builder::UrlBuilder;

const NOT_AVAILABLE: &str = "N/A";
const MIN_PARAGRAPH_CHARS: usize = 31;
const REQUIREMENT_CHARS: std::ops::Range<usize> = 11..500;
const MAX_REQUIREMENTS: usize = 20;
const PARAGRAPH_STOPWORDS: &[&str] = &["cookie", "JobStreet"];

pub const NO_DESCRIPTION: &str =
    "Deskripsi tidak tersedia. Silakan kunjungi link asli untuk melihat detail lengkap.";

/// 6 to 10 ASCII digits, surrounding whitespace ignored.
pub fn validate_job_id(raw: &str) -> Result<&str> {
    let id = raw.trim();
    if (6..=10).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id)
    } else {
        Err(Error::invalid("jobId", "must be numeric (6-10 digits)"))
    }
}

struct Field {
    primary: Selector,
    label: &'static str,
}

pub struct DetailScraper {
    title: Selector,
    any_h1: Selector,
    company: Field,
    location: Field,
    salary: Field,
    job_type: Field,
    posted: Field,
    label_span: Selector,
    paragraph: Selector,
    list_item: Selector,
}

impl Default for DetailScraper {
    fn default() -> Self {
        let sel = |css: &str| Selector::parse(css).expect("static selector");
        let field = |automation: &str, label| Field {
            primary: sel(&format!(r#"[data-automation="{automation}"]"#)),
            label,
        };
        Self {
            title: sel(r#"h1[data-automation="job-detail-title"]"#),
            any_h1: sel("h1"),
            company: field("advertiser-name", "Company"),
            location: field("job-detail-location", "Location"),
            salary: field("job-detail-salary", "Salary"),
            job_type: field("job-detail-work-type", "Job type"),
            posted: field("job-detail-date", "Posted"),
            label_span: sel("span"),
            paragraph: sel("p"),
            list_item: sel("li"),
        }
    }
}

impl DetailScraper {
    pub async fn scrape(
        &self,
        client: &FetchClient,
        urls: &UrlBuilder,
        job_id: &str,
        timeout: Duration,
    ) -> Result<JobDetail> {
        let id = validate_job_id(job_id)?;
        let url = urls.detail_url(id)?;
        let html = match client.fetch_html(&url, timeout).await {
            Ok(html) => html,
            Err(Error::FetchHttp { status: 404, .. }) => {
                warn!(job_id = id, "detail page 404");
                return Err(Error::JobNotFound { id: id.to_string() });
            }
            Err(e) => return Err(e),
        };
        let detail = self.parse(&html, id, url.as_str())?;
        info!(job_id = id, title = %detail.title, "scraped job detail");
        Ok(detail)
    }

    pub fn parse(&self, html: &str, job_id: &str, apply_url: &str) -> Result<JobDetail> {
        let doc = Html::parse_document(html);

        let title = first_text(&doc, &self.title)
            .or_else(|| first_text(&doc, &self.any_h1))
            .unwrap_or_default();
        if title.chars().count() < 3 {
            return Err(Error::JobNotFound {
                id: job_id.to_string(),
            });
        }

        let mut description: Vec<String> = doc
            .select(&self.paragraph)
            .map(element_text)
            .filter(|t| {
                t.chars().count() >= MIN_PARAGRAPH_CHARS
                    && !PARAGRAPH_STOPWORDS.iter().any(|w| t.contains(w))
            })
            .collect();
        if description.is_empty() {
            description.push(NO_DESCRIPTION.to_string());
        }

        let requirements = doc
            .select(&self.list_item)
            .map(element_text)
            .filter(|t| REQUIREMENT_CHARS.contains(&t.chars().count()))
            .take(MAX_REQUIREMENTS)
            .collect();

        Ok(JobDetail {
            job_id: job_id.to_string(),
            title,
            company: self
                .field(&doc, &self.company)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            location: self
                .field(&doc, &self.location)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            salary: self.field(&doc, &self.salary),
            job_type: self.field(&doc, &self.job_type),
            posted_label: self
                .field(&doc, &self.posted)
                .unwrap_or_else(|| UNKNOWN_POSTED.to_string()),
            description,
            requirements,
            apply_url: apply_url.to_string(),
        })
    }

    /// Data-attribute element first, then the element right after a
    /// `<span>` whose text carries the label.
    fn field(&self, doc: &Html, field: &Field) -> Option<String> {
        first_text(doc, &field.primary).or_else(|| {
            doc.select(&self.label_span)
                .find(|span| element_text(*span).contains(field.label))
                .and_then(|span| span.next_siblings().find_map(ElementRef::wrap))
                .map(element_text)
                .filter(|t| !t.is_empty())
        })
    }
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PAGE: &str = r#"<html><body>
        <h1 data-automation="job-detail-title">Rust Backend Engineer</h1>
        <span data-automation="advertiser-name">PT Nusantara Digital</span>
        <span data-automation="job-detail-location">Jakarta Selatan, Jakarta Raya</span>
        <div><span>Job type</span><span>Full time</span></div>
        <span data-automation="job-detail-date">Diposting 3 hari yang lalu</span>
        <p>Kami mencari engineer untuk membangun layanan pembayaran berskala besar.</p>
        <p>Pendek.</p>
        <p>We use cookie banners on this page to improve your experience.</p>
        <ul>
          <li>Pengalaman minimal 3 tahun dengan Rust atau Go</li>
          <li>SQL</li>
          <li>Memahami sistem terdistribusi dan observability</li>
        </ul>
    </body></html>"#;

    #[test]
    fn parses_fields_with_label_fallback() {
        let d = DetailScraper::default()
            .parse(PAGE, "89023836", "https://id.jobstreet.com/id/job/89023836")
            .unwrap();
        assert_eq!(d.title, "Rust Backend Engineer");
        assert_eq!(d.company, "PT Nusantara Digital");
        assert_eq!(d.location, "Jakarta Selatan, Jakarta Raya");
        assert_eq!(d.job_type.as_deref(), Some("Full time"));
        assert_eq!(d.salary, None);
        assert_eq!(d.posted_label, "Diposting 3 hari yang lalu");
        assert_eq!(d.description.len(), 1);
        assert!(d.description[0].starts_with("Kami mencari"));
        assert_eq!(d.requirements.len(), 2);
    }

    #[test]
    fn missing_title_is_not_found() {
        let err = DetailScraper::default()
            .parse("<html><body><p>Halaman tidak ditemukan</p></body></html>", "12345678", "x")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JobNotFound);
    }

    #[test]
    fn empty_description_gets_placeholder() {
        let d = DetailScraper::default()
            .parse("<html><body><h1>Kasir Toko</h1></body></html>", "12345678", "x")
            .unwrap();
        assert_eq!(d.description, vec![NO_DESCRIPTION.to_string()]);
        assert_eq!(d.company, "N/A");
        assert!(d.requirements.is_empty());
    }

    #[test]
    fn requirements_are_capped() {
        let items: String = (0..30)
            .map(|i| format!("<li>Persyaratan nomor {i} yang cukup panjang</li>"))
            .collect();
        let html = format!("<html><body><h1>Operator Produksi</h1><ul>{items}</ul></body></html>");
        let d = DetailScraper::default().parse(&html, "12345678", "x").unwrap();
        assert_eq!(d.requirements.len(), MAX_REQUIREMENTS);
    }

    #[test]
    fn job_id_validation() {
        assert_eq!(validate_job_id(" 89023836 ").unwrap(), "89023836");
        for bad in ["12345", "12345678901", "89O23836", "", "abc"] {
            assert_eq!(
                validate_job_id(bad).unwrap_err().kind(),
                ErrorKind::InvalidParameter,
                "{bad:?}"
            );
        }
    }
}
