use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result, anyhow};
use tracing::info;

use jobclaw::conf::Settings;
use jobclaw::{JobService, api, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("invalid configuration")?;
    logging::init(&settings.logging).map_err(|e| anyhow!("logging init failed: {e}"))?;

    let service = web::Data::new(JobService::new(&settings).context("service setup failed")?);
    let addr = (settings.listen_host.clone(), settings.listen_port);
    info!(
        host = %addr.0,
        port = addr.1,
        base = %settings.base_url,
        respect_robots = settings.respect_robots,
        "starting jobclaw"
    );

    HttpServer::new(move || App::new().app_data(service.clone()).configure(api::configure))
        .bind(addr)
        .context("bind failed")?
        .run()
        .await
        .context("server error")
}
