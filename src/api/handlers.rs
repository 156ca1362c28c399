use std::collections::HashMap;

use actix_web::http::header::CACHE_CONTROL;
use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use super::ApiError;
use crate::aggregate::aggregate;
use crate::filter::{SearchFilter, SortOrder};
use crate::model::JobRecord;
use crate::scrape::ScrapeOptions;
use crate::service::{FailurePolicy, JobService};
use crate::url_builder::ListingQuery;

const JOBS_PARAMS: &[&str] = &["limit", "page"];
const SEARCH_MAX_AGE: u64 = 600;
const LATEST_MAX_AGE: u64 = 600;
const UNAVAILABLE: &str = "Data sementara tidak tersedia";

type Service = web::Data<JobService>;

// -------------------------
// Helpers
// -------------------------

fn parse_query<T: DeserializeOwned>(req: &HttpRequest) -> Result<T, ApiError> {
    web::Query::<T>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .map_err(|e| ApiError::bad_request(format!("Invalid query: {e}")))
}

/// Lenient integer param: missing, unparsable or zero gives `default`.
fn int_param(params: &HashMap<String, String>, key: &str, default: i64) -> i64 {
    params
        .get(key)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n != 0)
        .unwrap_or(default)
}

/// `page` as a 1-based page number. Missing or zero means 1.
fn page_param(params: &HashMap<String, String>) -> Result<u32, ApiError> {
    let page = int_param(params, "page", 1);
    if page < 1 {
        return Err(ApiError::bad_request("Page must be greater than 0"));
    }
    u32::try_from(page).map_err(|_| ApiError::bad_request("Page is out of range"))
}

fn cache_control(ttl_secs: u64) -> (actix_web::http::header::HeaderName, String) {
    (CACHE_CONTROL, format!("s-maxage={ttl_secs}, stale-while-revalidate"))
}

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

// -------------------------
// Handlers
// -------------------------

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body(
        "jobclaw online.\n\
         Listings:\n  GET /api/jobs?limit=30&page=1\n  GET /api/jobs/latest?limit=6\n  GET /api/jobs/all?page=1\n\
         Detail:\n  GET /api/jobs/{jobId}\n\
         Search:\n  GET /api/search?location=banten&classification=...&q=...&salaryMin=...&jobType=...&category=...&sort=latest\n\
         Feeds:\n  GET /api/jobstreet?page=1&limit=20\n  GET /api/filters\n\
         Stream:\n  GET /api/jobs/stream?location=...&pages=3 (SSE)\n\
         Ops:\n  GET /api/cache/stats\n  GET /healthz",
    )
}

#[get("/healthz")]
pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[get("/api/jobs")]
pub async fn jobs(req: HttpRequest, svc: Service) -> Result<HttpResponse, ApiError> {
    let params: HashMap<String, String> = parse_query(&req)?;
    let mut invalid: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|k| !JOBS_PARAMS.contains(k))
        .collect();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        return Ok(HttpResponse::BadRequest().json(json!({
            "status": "error",
            "statusCode": 400,
            "message": format!("Invalid parameter(s): {}", invalid.join(", ")),
            "validParameters": JOBS_PARAMS,
            "hint": "For search/filter features, use /api/search or /api/jobstreet endpoints",
        })));
    }

    let limit = int_param(&params, "limit", 30).clamp(1, 100) as usize;
    let page = page_param(&params)?;

    let listing = svc
        .listing(
            &ListingQuery::default().with_page(page),
            ScrapeOptions::with_limit(limit),
            FailurePolicy::Fallback,
        )
        .await?;
    let page_data = listing.outcome.page();
    info!(
        page,
        limit,
        jobs = page_data.records.len(),
        provenance = listing.outcome.provenance(),
        "jobs served"
    );

    Ok(HttpResponse::Ok()
        .insert_header(cache_control(svc.listing_ttl_secs()))
        .json(json!({
            "status": "success",
            "statusCode": 200,
            "message": format!("Successfully fetched {} jobs", page_data.records.len()),
            "data": {
                "jobs": page_data.records,
                "metadata": {
                    "total": page_data.records.len(),
                    "page": page,
                    "limit": limit,
                    "hasNextPage": page_data.has_next_page,
                    "provenance": listing.outcome.provenance(),
                    "cached": listing.cached,
                    "scrapedAt": now_rfc3339(),
                }
            }
        })))
}

#[get("/api/jobs/latest")]
pub async fn jobs_latest(req: HttpRequest, svc: Service) -> impl Responder {
    let params: HashMap<String, String> = parse_query(&req).unwrap_or_default();
    let limit = int_param(&params, "limit", 6).clamp(1, 8) as usize;

    let latest: Vec<JobRecord> = match svc.latest(ScrapeOptions::with_limit(limit)).await {
        Ok(listing) if !listing.outcome.is_fallback() => listing.outcome.into_page().records,
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "latest feed unavailable");
            Vec::new()
        }
    };

    HttpResponse::Ok()
        .insert_header(cache_control(LATEST_MAX_AGE))
        .json(if latest.is_empty() {
            json!({
                "status": "error",
                "statusCode": 200,
                "message": UNAVAILABLE,
                "jobs": [],
            })
        } else {
            json!({
                "status": "success",
                "statusCode": 200,
                "message": format!("Successfully fetched {} latest jobs", latest.len()),
                "jobs": latest,
            })
        })
}

#[derive(Deserialize)]
struct PageParams {
    page: Option<u32>,
}

#[get("/api/jobs/all")]
pub async fn jobs_all(req: HttpRequest, svc: Service) -> Result<HttpResponse, ApiError> {
    let params: PageParams = parse_query(&req)?;
    let page = params.page.unwrap_or(1).max(1);

    let listing = svc
        .listing(
            &ListingQuery::default().with_page(page),
            ScrapeOptions::default(),
            FailurePolicy::Strict,
        )
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to fetch all jobs"))?;
    let records = listing.outcome.records();

    Ok(HttpResponse::Ok()
        .insert_header(cache_control(svc.listing_ttl_secs()))
        .json(json!({
            "success": true,
            "meta": {
                "totalJobs": records.len(),
                "page": page,
                "type": "all",
                "provenance": listing.outcome.provenance(),
                "hasNextPage": listing.outcome.page().has_next_page,
                "scrapedAt": now_rfc3339(),
            },
            "classifications": aggregate(records),
            "jobs": records,
        })))
}

#[get("/api/jobs/{job_id}")]
pub async fn job_detail(path: web::Path<String>, svc: Service) -> Result<HttpResponse, ApiError> {
    let job_id = path.into_inner();
    let detail = svc
        .detail(&job_id)
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to scrape job detail"))?;

    Ok(HttpResponse::Ok()
        .insert_header(cache_control(svc.listing_ttl_secs()))
        .json(json!({
            "status": "success",
            "statusCode": 200,
            "message": "Job detail retrieved successfully",
            "data": detail,
            "updated_at": now_rfc3339(),
        })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    location: Option<String>,
    classification: Option<String>,
    q: Option<String>,
    page: Option<u32>,
    limit: Option<usize>,
    salary_min: Option<u64>,
    job_type: Option<String>,
    category: Option<String>,
    sort: Option<SortOrder>,
}

#[get("/api/search")]
pub async fn search(req: HttpRequest, svc: Service) -> Result<HttpResponse, ApiError> {
    let params: SearchParams = parse_query(&req)?;
    let Some(location) = params.location.filter(|l| !l.trim().is_empty()) else {
        return Err(ApiError::bad_request(
            "Parameter \"location\" is required, e.g. /api/search?location=banten",
        ));
    };
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(30).clamp(1, 100);

    let query = ListingQuery {
        keyword: params.q,
        location: Some(location),
        classification: params.classification,
        tag: None,
        page: Some(page),
    };
    let filter = SearchFilter {
        salary_min: params.salary_min,
        job_type: params.job_type,
        category: params.category,
        sort: params.sort.unwrap_or_default(),
    };
    let listing = svc
        .search(&query, &filter, ScrapeOptions::with_limit(limit))
        .await
        .map_err(|e| ApiError::from_core(e, "Failed to search jobs"))?;
    let records = listing.outcome.records();

    Ok(HttpResponse::Ok()
        .insert_header(cache_control(SEARCH_MAX_AGE))
        .json(json!({
            "query": {
                "location": query.location,
                "classification": query.classification,
                "q": query.keyword,
                "page": page,
                "url": listing.url.as_str(),
            },
            "meta": {
                "provenance": listing.outcome.provenance(),
                "scrapedAt": now_rfc3339(),
                "totalJobs": records.len(),
                "hasNextPage": listing.outcome.page().has_next_page,
                "cached": listing.cached,
            },
            "jobs": records,
        })))
}

#[get("/api/filters")]
pub async fn filters(svc: Service) -> impl Responder {
    let body = match svc.filters().await {
        Ok(summary) => json!({
            "status": "success",
            "statusCode": 200,
            "message": "Filters retrieved successfully",
            "updated_at": now_rfc3339(),
            "data": {
                "categories": summary.categories,
                "locations": summary.locations,
                "metadata": {
                    "total_jobs_analyzed": summary.total_jobs_analyzed,
                    "total_categories": summary.categories.len(),
                    "total_locations": summary.locations.len(),
                }
            }
        }),
        Err(e) => {
            warn!(error = %e, "filters unavailable, serving defaults");
            let categories: Vec<_> = ["IT", "Design", "Marketing", "Sales", "Finance"]
                .iter()
                .map(|name| json!({ "name": name, "count": 0 }))
                .collect();
            let locations = ["Jakarta", "Bandung", "Surabaya", "Semarang", "Medan"];
            json!({
                "status": "success",
                "statusCode": 200,
                "message": "Returning default filters",
                "updated_at": now_rfc3339(),
                "data": {
                    "categories": categories,
                    "locations": locations,
                    "metadata": {
                        "total_jobs_analyzed": 0,
                        "total_categories": categories.len(),
                        "total_locations": locations.len(),
                        "note": "Default filters due to scraping error",
                    }
                }
            })
        }
    };
    HttpResponse::Ok()
        .insert_header(cache_control(svc.filters_ttl_secs()))
        .json(body)
}

#[get("/api/jobstreet")]
pub async fn jobstreet(req: HttpRequest, svc: Service) -> Result<HttpResponse, ApiError> {
    let params: HashMap<String, String> = parse_query(&req)?;
    let page = page_param(&params)?;
    let limit = int_param(&params, "limit", 20);
    if !(1..=50).contains(&limit) {
        return Err(ApiError::bad_request("Limit must be between 1 and 50"));
    }

    let listing = svc
        .recommendations(page, ScrapeOptions::with_limit(limit as usize))
        .await?;
    let page_data = listing.outcome.page();

    Ok(HttpResponse::Ok()
        .insert_header(cache_control(svc.recommendations_ttl_secs()))
        .json(json!({
            "success": !listing.outcome.is_fallback(),
            "data": page_data.records,
            "meta": {
                "total": page_data.records.len(),
                "page": page,
                "per_page": limit,
                "has_next_page": page_data.has_next_page,
            },
            "provenance": listing.outcome.provenance(),
            "cached": listing.cached,
            "timestamp": now_rfc3339(),
        })))
}

#[get("/api/cache/stats")]
pub async fn cache_stats(svc: Service) -> impl Responder {
    HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-store"))
        .json(json!({
            "status": "success",
            "statusCode": 200,
            "data": svc.cache_stats(),
        }))
}
