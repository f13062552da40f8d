#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use reqwest::Client;
use tempfile::NamedTempFile;
use tinylink::application::services::LinkService;
use tinylink::infrastructure::persistence::SqliteLinkStore;
use tinylink::reputation::{ReputationGate, WhitelistMatcher, WhitelistSource};
use tinylink::state::AppState;

/// Hosts every test whitelist accepts.
pub const ALLOWED_HOSTS: &str = "example.com\n.trusted.org\n";

/// Token the test state's dump endpoint expects.
pub const DUMP_TOKEN: &str = "test-dump-token";

/// Builds an [`AppState`] over a fresh in-memory store.
///
/// The gate runs a whitelist admitting [`ALLOWED_HOSTS`] and nothing else; no
/// blocklist, no reachability probe. The returned temp file backs the
/// whitelist and must outlive the state.
pub async fn create_test_state() -> (AppState, NamedTempFile) {
    let store = Arc::new(SqliteLinkStore::open("sqlite::memory:").await.unwrap());

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{ALLOWED_HOSTS}").unwrap();

    let whitelist = Arc::new(WhitelistMatcher::new(
        WhitelistSource::File(file.path().to_path_buf()),
        Client::new(),
    ));
    whitelist.reload_if_modified().await.unwrap();

    let gate = ReputationGate::new(Some(whitelist.clone()), None, None, 60);

    let state = AppState {
        link_service: Arc::new(LinkService::new(store, gate)),
        dump_token: Arc::new(DUMP_TOKEN.to_string()),
        whitelist: Some(whitelist),
        tlds: None,
    };

    (state, file)
}

/// Shortens `url` through the service, returning the assigned key.
pub async fn seed_link(state: &AppState, url: &str) -> String {
    state
        .link_service
        .submit(url)
        .await
        .unwrap()
        .as_str()
        .to_string()
}
