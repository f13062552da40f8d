//! DTOs for the URL submission endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The URL to shorten (must be a reachable HTTP/HTTPS URL).
    #[validate(length(min = 12, message = "URL must be at least 12 characters long"))]
    pub url: String,
}

/// Response carrying the short key for the submitted URL.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::application::services::MIN_URL_LENGTH;

    #[test]
    fn test_request_length_matches_service_minimum() {
        // The validator attribute needs a literal; keep it in sync.
        assert_eq!(MIN_URL_LENGTH, 12);
    }

    #[test]
    fn test_request_validation() {
        let request = ShortenRequest {
            url: "https://example.com/page".to_string(),
        };
        assert!(request.validate().is_ok());

        let request = ShortenRequest {
            url: "http://a.b".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_response_serializes_to_id_field() {
        let response = ShortenResponse {
            id: "u8ovL4".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "id": "u8ovL4" }));
    }
}
