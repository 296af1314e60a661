pub mod chat;
pub mod health;
pub mod home;
pub mod keys;
pub mod predict;
pub mod weather;

pub use chat::*;
pub use health::*;
pub use home::*;
pub use keys::*;
pub use predict::*;
pub use weather::*;

use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use utoipa::ToSchema;

/// Request body shared by the weather and predict endpoints.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: Option<String>,
}

/// Location echo included in responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl From<&LocationRequest> for LocationInfo {
    fn from(req: &LocationRequest) -> Self {
        Self {
            latitude: req.latitude,
            longitude: req.longitude,
            city: req.city.clone(),
        }
    }
}

/// RFC 3339 timestamp for response bodies.
pub(crate) fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
