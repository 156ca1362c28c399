// --------------
// SSE streaming
// --------------

use actix_web::{HttpRequest, HttpResponse, get, web};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::yield_now;
use tracing::{info, warn};

use super::ApiError;
use super::handlers::now_rfc3339;
use crate::fetch::polite_pause;
use crate::scrape::ScrapeOptions;
use crate::service::JobService;
use crate::url_builder::ListingQuery;

const DEFAULT_PAGES: u32 = 3;
const MAX_PAGES: u32 = 10;

#[derive(Deserialize)]
struct StreamParams {
    keyword: Option<String>,
    q: Option<String>,
    location: Option<String>,
    classification: Option<String>,
    tag: Option<String>,
    page: Option<u32>,
    pages: Option<u32>,
    limit: Option<usize>,
}

pub(crate) fn sse_event(event: &str, data: &serde_json::Value) -> Bytes {
    Bytes::from(format!("event: {event}\ndata: {data}\n\n"))
}

/// Walks consecutive listing pages, one `page` event each, until a page
/// comes back short, a fallback shows up, or `pages` is reached.
#[get("/api/jobs/stream")]
pub async fn jobs_stream(
    req: HttpRequest,
    svc: web::Data<JobService>,
) -> Result<HttpResponse, ApiError> {
    let params: StreamParams = web::Query::<StreamParams>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .map_err(|e| ApiError::bad_request(format!("Invalid query: {e}")))?;

    let query = ListingQuery {
        keyword: params.keyword.or(params.q),
        location: params.location,
        classification: params.classification,
        tag: params.tag,
        page: None,
    };
    let first_page = params.page.unwrap_or(1).max(1);
    let max_pages = params.pages.unwrap_or(DEFAULT_PAGES).clamp(1, MAX_PAGES);
    let opts = ScrapeOptions::with_limit(params.limit.unwrap_or(30).clamp(1, 100));

    // reject bad input before opening the stream
    let start_url = svc.urls().listing_url(&query.clone().with_page(first_page))?;

    let (tx, mut rx) = mpsc::channel::<Bytes>(32);
    actix_web::rt::spawn(async move {
        let _ = tx
            .send(sse_event(
                "start",
                &json!({
                    "url": start_url.as_str(),
                    "maxPages": max_pages,
                    "startedAt": now_rfc3339(),
                }),
            ))
            .await;

        let mut pages = 0u32;
        let mut total = 0usize;
        let mut page = first_page;
        loop {
            if pages >= max_pages {
                break;
            }
            let url = match svc.urls().listing_url(&query.clone().with_page(page)) {
                Ok(u) => u,
                Err(e) => {
                    let _ = tx.send(sse_event("error", &json!({ "error": e.to_string() }))).await;
                    return;
                }
            };
            pages += 1;

            let outcome = match svc.scrape_page(&url, opts).await {
                Ok(o) => o,
                Err(e) => {
                    warn!(%url, error = %e, "stream page failed");
                    let _ = tx
                        .send(sse_event(
                            "error",
                            &json!({ "page": page, "url": url.as_str(), "error": e.to_string() }),
                        ))
                        .await;
                    return;
                }
            };

            let records = outcome.records();
            if !outcome.is_fallback() {
                total += records.len();
            }
            let payload = json!({
                "page": page,
                "url": url.as_str(),
                "count": records.len(),
                "provenance": outcome.provenance(),
                "jobs": records,
                "totalSoFar": total,
            });
            if tx.send(sse_event("page", &payload)).await.is_err() {
                // client went away
                return;
            }

            if outcome.is_fallback() || !outcome.page().has_next_page {
                break;
            }
            let Some(next) = page.checked_add(1) else {
                break;
            };
            page = next;
            polite_pause().await;
            yield_now().await;
        }

        info!(pages, total, "stream finished");
        let _ = tx
            .send(sse_event("done", &json!({ "pages": pages, "totalJobs": total })))
            .await;
    });

    let stream = async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<Bytes, actix_web::Error>(chunk);
        }
    };

    Ok(HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(stream))
}
