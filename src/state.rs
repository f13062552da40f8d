use std::sync::Arc;

use crate::application::services::LinkService;
use crate::infrastructure::persistence::SqliteLinkStore;
use crate::reputation::{TldCache, WhitelistMatcher};

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<SqliteLinkStore>>,
    /// Token guarding the dump endpoint.
    pub dump_token: Arc<String>,
    /// Present when the whitelist stage is enabled; the health endpoint
    /// reports its snapshot size.
    pub whitelist: Option<Arc<WhitelistMatcher>>,
    /// Present when the blocklist stage is enabled.
    pub tlds: Option<Arc<TldCache>>,
}
