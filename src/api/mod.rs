//! HTTP surface. Handlers translate query parameters, pick a failure policy
//! and shape the JSON; the scraping itself lives in [`crate::service`].

mod error;
mod handlers;
mod stream;

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{HttpResponse, web};

pub use error::ApiError;

/// Registers every route. `/api/jobs/latest`, `/all` and `/stream` go in
/// before `/api/jobs/{job_id}` so the literal paths win.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "GET, OPTIONS"))
                    .add(("Access-Control-Allow-Headers", "Content-Type")),
            )
            .service(handlers::index)
            .service(handlers::healthz)
            .service(handlers::jobs)
            .service(handlers::jobs_latest)
            .service(handlers::jobs_all)
            .service(stream::jobs_stream)
            .service(handlers::job_detail)
            .service(handlers::search)
            .service(handlers::filters)
            .service(handlers::jobstreet)
            .service(handlers::cache_stats)
            .route(
                "/{tail:.*}",
                web::method(Method::OPTIONS).to(|| async { HttpResponse::Ok().finish() }),
            ),
    );
}
