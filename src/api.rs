//! Request and response bodies exchanged with the plot server.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CURRENT_USER_PATH: &str = "/api/current_user";
pub const REGISTER_PATH: &str = "/api/register";
pub const LOGIN_PATH: &str = "/api/login";
pub const LOGOUT_PATH: &str = "/api/logout";
pub const LIST_PATH: &str = "/api/list";
pub const SAVE_PATH: &str = "/save";

/// Credential data for login and registration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `{ok: bool}` acknowledgement returned by mutating endpoints.
///
/// Failed requests carry an `error` message as well; it is kept for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /api/current_user`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub username: Option<String>,
}

/// One entry of `GET /api/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlot {
    pub id: i64,
    pub expr: String,
    pub created_at: String,
}

impl fmt::Display for SavedPlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.id, self.expr, self.created_at)
    }
}

/// Body of `POST /save`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub expr: String,

    /// Plot snapshot as a `data:image/...;base64,` URL
    pub image: String,
}
