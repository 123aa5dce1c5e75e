//! Current user bootstrap from the page's embedded JSON

use serde::{Deserialize, Serialize};

/// Element id the server renders the user JSON into
pub const USER_DATA_ELEMENT_ID: &str = "user-data";

/// The logged-in member as the page describes them
///
/// Only the identifying fields are typed; everything else the server sends
/// is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CurrentUser {
    /// Parse embedded user data; malformed JSON means no current user
    pub fn from_embedded(text: &str) -> Option<Self> {
        match serde_json::from_str::<CurrentUser>(text.trim()) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(error = %err, "error parsing user data");
                None
            }
        }
    }
}
