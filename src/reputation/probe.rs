//! Reachability probe: one plain GET against the submitted URL.

use std::time::Duration;

/// Fetches submitted URLs once to confirm they actually answer.
///
/// The probe follows redirects, requires a success status and drains the
/// body, so a URL only passes when a real response came back within the
/// configured timeouts.
pub struct ReachabilityProbe {
    client: reqwest::Client,
}

impl ReachabilityProbe {
    /// Builds the probe with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns the underlying client construction error, e.g. when no TLS
    /// backend is available.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tinylink/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// GETs `url` and drains the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, timeout, or a non-success
    /// status.
    pub async fn check(&self, url: &str) -> Result<(), reqwest::Error> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;
        while response.chunk().await?.is_some() {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn probe() -> ReachabilityProbe {
        ReachabilityProbe::new(Duration::from_secs(1), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_reachable_url_passes() {
        let base = serve(Router::new().route("/", get(|| async { "hello" }))).await;
        assert!(probe().check(&base).await.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_fails() {
        let base = serve(Router::new().route(
            "/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        assert!(probe().check(&base).await.is_err());
    }

    #[tokio::test]
    async fn test_connection_refused_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(probe().check(&format!("http://{addr}/")).await.is_err());
    }
}
