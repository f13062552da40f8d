//! HTTP server initialization and runtime setup.
//!
//! Handles storage setup, reputation stage assembly, background refresh
//! loops, and the Axum server lifecycle.

use crate::api::routes::app_router;
use crate::application::services::LinkService;
use crate::config::{self, Config};
use crate::infrastructure::persistence::SqliteLinkStore;
use crate::reputation::{
    HickoryResolver, ReachabilityProbe, ReputationGate, SurblChecker, TldCache, WhitelistMatcher,
    tld, whitelist,
};
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Data directory and dump token
/// - SQLite store (applies migrations)
/// - Enabled reputation stages with their background refresh loops
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - The data directory or dump token cannot be created
/// - The store cannot be opened
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

    let dump_token = config::load_or_create_dump_token(&config.data_dir, config.dump_key.as_deref())?;

    let store = SqliteLinkStore::open(&config.database_url)
        .await
        .context("Failed to open store")?;
    tracing::info!("Store ready at {}", config.database_url);

    let fetch_client = reqwest::Client::builder()
        .user_agent(concat!("tinylink/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(config.connect_timeout())
        .timeout(config.read_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    if !config.checks.any_enabled() {
        tracing::warn!("All reputation checks are disabled; every URL will be accepted");
    }

    let whitelist_matcher = if config.checks.whitelist {
        let source = whitelist::WhitelistSource::parse(&config.whitelist_source);
        let matcher = Arc::new(WhitelistMatcher::new(source, fetch_client.clone()));
        if let Err(e) = matcher.reload_if_modified().await {
            tracing::warn!("Whitelist not loaded yet, accepting all hosts: {e}");
        }
        tokio::spawn(whitelist::run_reload_loop(matcher.clone()));
        Some(matcher)
    } else {
        None
    };

    let tld_cache = if config.checks.surbl {
        let cache = Arc::new(TldCache::new(
            &config.data_dir,
            &config.two_level_tld_url,
            &config.three_level_tld_url,
            fetch_client.clone(),
        ));
        cache.load_or_refresh().await;
        tokio::spawn(tld::run_refresh_loop(cache.clone()));
        Some(cache)
    } else {
        None
    };

    let surbl = tld_cache.as_ref().map(|tlds| {
        let resolver = HickoryResolver::new(&config.dns_servers, config.connect_timeout());
        SurblChecker::new(Arc::new(resolver), tlds.clone(), config.surbl_zone.clone())
    });

    let probe = if config.checks.reachability {
        Some(
            ReachabilityProbe::new(config.connect_timeout(), config.read_timeout())
                .context("Failed to build reachability probe")?,
        )
    } else {
        None
    };

    let gate = ReputationGate::new(
        whitelist_matcher.clone(),
        surbl,
        probe,
        config.check_cache_ttl_seconds,
    );

    let link_service = Arc::new(LinkService::new(Arc::new(store), gate));

    let state = AppState {
        link_service,
        dump_token: Arc::new(dump_token),
        whitelist: whitelist_matcher,
        tlds: tld_cache,
    };

    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}
