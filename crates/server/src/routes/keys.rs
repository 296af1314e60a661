use axum::Json;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Demo credential prefix.
const KEY_PREFIX: &str = "wgpt_";

/// Hex digits of the digest kept in the key.
const KEY_DIGEST_LEN: usize = 32;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApiKeyRequest {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct KeyHeaders {
    #[serde(rename = "X-API-Key")]
    pub x_api_key: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct KeyUsage {
    pub endpoint: String,
    pub headers: KeyHeaders,
    pub example_curl: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyResponse {
    pub success: bool,
    pub api_key: String,
    pub message: String,
    pub usage: KeyUsage,
}

/// Derive a demo key from the requester identity and the current time.
/// This is a placeholder credential; nothing validates it.
fn derive_key(email: &str, name: &str, now: OffsetDateTime) -> String {
    let salt = format!("{}.{}", now.unix_timestamp(), now.nanosecond());
    let digest = Sha256::digest(format!("{email}{name}{salt}").as_bytes());
    format!("{}{}", KEY_PREFIX, &hex::encode(digest)[..KEY_DIGEST_LEN])
}

#[utoipa::path(
    post,
    path = "/api/generate-key",
    request_body = ApiKeyRequest,
    responses(
        (status = OK, description = "Demo API key with usage example", body = ApiKeyResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Malformed request body")
    ))]
pub async fn generate_key(Json(req): Json<ApiKeyRequest>) -> Json<ApiKeyResponse> {
    let api_key = derive_key(&req.email, &req.name, OffsetDateTime::now_utc());

    let example_curl = format!(
        "curl -X POST https://api.weathergpt.ai/v1/forecast \\\n  -H \"X-API-Key: {}\" \\\n  -H \"Content-Type: application/json\" \\\n  -d '{{\"latitude\": 40.7128, \"longitude\": -74.0060}}'",
        api_key
    );

    Json(ApiKeyResponse {
        success: true,
        api_key: api_key.clone(),
        message: "API key generated successfully (demo only)".to_string(),
        usage: KeyUsage {
            endpoint: "https://api.weathergpt.ai/v1/forecast".to_string(),
            headers: KeyHeaders { x_api_key: api_key },
            example_curl,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::format_description::well_known::Rfc3339;

    #[test]
    fn derived_key_shape() {
        let now = OffsetDateTime::parse("2024-06-01T12:00:00Z", &Rfc3339).unwrap();
        let key = derive_key("a@example.com", "Ada", now);
        assert!(key.starts_with(KEY_PREFIX));
        assert_eq!(key.len(), KEY_PREFIX.len() + KEY_DIGEST_LEN);
        assert!(key[KEY_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_depends_on_identity_and_time() {
        let now = OffsetDateTime::parse("2024-06-01T12:00:00Z", &Rfc3339).unwrap();
        let later = OffsetDateTime::parse("2024-06-01T12:00:01Z", &Rfc3339).unwrap();

        let base = derive_key("a@example.com", "Ada", now);
        assert_ne!(base, derive_key("b@example.com", "Ada", now));
        assert_ne!(base, derive_key("a@example.com", "Bob", now));
        assert_ne!(base, derive_key("a@example.com", "Ada", later));
        // Same inputs reproduce the same key.
        assert_eq!(base, derive_key("a@example.com", "Ada", now));
    }
}
