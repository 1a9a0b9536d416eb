//! Types exchanged with the upstream orbit provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An orbit file advertised by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamOrbit {
    /// Product file name, e.g. `S1A_OPER_AUX_POEORB_OPOD_..._V..._....EOF`.
    pub filename: String,
    /// Upstream product identifier used for downloads.
    pub id: String,
}

impl UpstreamOrbit {
    pub fn new(filename: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            id: id.into(),
        }
    }
}

/// Account credentials for the upstream token endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An issued upstream session.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub session_id: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("session_id", &self.session_id)
            .finish()
    }
}
