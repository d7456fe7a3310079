use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Short-lived bearer token for the push gateway
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: Instant,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Credential valid for `lifetime` starting now
    pub fn expiring_in(access_token: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(access_token, Instant::now() + lifetime)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// True while more than `margin` remains before expiry
    pub fn is_fresh_at(&self, now: Instant, margin: Duration) -> bool {
        now + margin < self.expires_at
    }
}

// Keeps the token out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
