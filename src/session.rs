//! Cookie-backed auth session handling.
//!
//! The session is an explicit value with clear construction (login),
//! refresh, and teardown — no ambient global state. It serializes to the
//! JSON auth cookie the web client stores: `{uid, email, role, displayName,
//! token, tokenExpiresAt, expiresAt}` with millisecond epoch timestamps.
//! The cookie itself lives seven days; the identity token inside it is
//! short-lived and is refreshed shortly before it expires.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SessionConfig;

pub const COOKIE_NAME: &str = "anuvadya_auth";

/// Account role. Production accounts additionally get access to the
/// fingerprint (piracy detection / ingestion) service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Production,
}

impl Role {
    pub fn can_verify_content(&self) -> bool {
        matches!(self, Role::Production)
    }
}

/// An authenticated session, as cached in the auth cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    /// Identity token from the auth provider; opaque here.
    pub token: String,
    /// Token expiry, ms since epoch.
    pub token_expires_at: i64,
    /// Cookie expiry, ms since epoch.
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at
    }
}

/// Constructs, encodes, refreshes, and tears down sessions. Injected where
/// needed rather than looked up globally.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Construct a session from a completed login or signup.
    pub fn login(
        &self,
        uid: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Session {
        let now = Utc::now().timestamp_millis();
        let session = Session {
            uid: uid.into(),
            email: email.into(),
            role,
            display_name: display_name.into(),
            token: token.into(),
            token_expires_at: now + self.config.token_lifetime_minutes * 60_000,
            expires_at: now + self.config.cookie_lifetime_days * 86_400_000,
        };
        info!("session started for {} ({:?})", session.email, session.role);
        session
    }

    /// Serialize a session to the cookie value.
    pub fn encode(&self, session: &Session) -> Result<String> {
        Ok(serde_json::to_string(session)?)
    }

    /// Parse a cookie value back into a session, rejecting expired cookies.
    pub fn decode(&self, cookie_value: &str) -> Result<Session> {
        let session: Session = serde_json::from_str(cookie_value)
            .map_err(|e| anyhow!("malformed auth cookie: {}", e))?;
        if session.is_expired() {
            return Err(anyhow!("session expired"));
        }
        Ok(session)
    }

    /// Whether the identity token is within the refresh margin of expiry.
    pub fn needs_refresh(&self, session: &Session) -> bool {
        let margin_ms = self.config.refresh_margin_minutes * 60_000;
        Utc::now().timestamp_millis() >= session.token_expires_at - margin_ms
    }

    /// Install a freshly issued token and extend both expiries.
    pub fn refresh(&self, session: &mut Session, token: impl Into<String>) {
        let now = Utc::now().timestamp_millis();
        session.token = token.into();
        session.token_expires_at = now + self.config.token_lifetime_minutes * 60_000;
        session.expires_at = now + self.config.cookie_lifetime_days * 86_400_000;
        debug!("session refreshed for {}", session.email);
    }

    /// Tear down a session. The caller is expected to clear the cookie.
    pub fn logout(&self, session: Session) {
        info!("session ended for {}", session.email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new(SessionConfig::default())
    }

    fn login() -> Session {
        manager().login("uid-1", "a@b.c", Role::User, "A B", "tok-1")
    }

    #[test]
    fn test_login_sets_expiries() {
        let session = login();
        let now = Utc::now().timestamp_millis();
        // Cookie lives ~7 days, token ~60 minutes.
        assert!(session.expires_at > now + 6 * 86_400_000);
        assert!(session.token_expires_at > now + 50 * 60_000);
        assert!(session.token_expires_at < session.expires_at);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_cookie_round_trip() {
        let mgr = manager();
        let session = login();
        let cookie = mgr.encode(&session).unwrap();
        let decoded = mgr.decode(&cookie).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_cookie_field_names() {
        let cookie = manager().encode(&login()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&cookie).unwrap();
        assert!(value.get("displayName").is_some());
        assert!(value.get("expiresAt").is_some());
        assert_eq!(value["role"], "user");
    }

    #[test]
    fn test_expired_cookie_rejected() {
        let mgr = manager();
        let mut session = login();
        session.expires_at = Utc::now().timestamp_millis() - 1;
        let cookie = mgr.encode(&session).unwrap();
        assert!(mgr.decode(&cookie).is_err());
    }

    #[test]
    fn test_malformed_cookie_rejected() {
        assert!(manager().decode("not json").is_err());
    }

    #[test]
    fn test_needs_refresh_within_margin() {
        let mgr = manager();
        let mut session = login();
        assert!(!mgr.needs_refresh(&session));
        // Token expiring in 4 minutes: inside the 5-minute margin.
        session.token_expires_at = Utc::now().timestamp_millis() + 4 * 60_000;
        assert!(mgr.needs_refresh(&session));
    }

    #[test]
    fn test_refresh_extends_token() {
        let mgr = manager();
        let mut session = login();
        session.token_expires_at = Utc::now().timestamp_millis() + 60_000;
        mgr.refresh(&mut session, "tok-2");
        assert_eq!(session.token, "tok-2");
        assert!(!mgr.needs_refresh(&session));
    }

    #[test]
    fn test_production_role_gate() {
        assert!(Role::Production.can_verify_content());
        assert!(!Role::User.can_verify_content());
    }
}
