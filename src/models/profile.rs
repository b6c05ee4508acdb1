use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-identity profile; created lazily on first sign-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Same id as the identity it belongs to
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
}

impl Profile {
    pub const TABLE: &'static str = "profiles";
}
