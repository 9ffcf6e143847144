//! OAuth client-credentials authentication
//!
//! `AuthManager` owns the current [`Credentials`] and the time they were
//! issued. Credentials are replaced wholesale on every exchange; expiry is
//! checked against an injectable [`Clock`] on each call.

use chrono::{DateTime, Duration, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::config::AppstoreConfig;
use crate::error::{AppstoreError, Result};
use crate::request::{RequestBody, RequestBuilder, Verb};
use crate::transport::HttpTransport;

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Credentials from a token exchange
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds from issuance
    pub expires_in: i64,
}

impl Credentials {
    /// Instant these credentials stop being valid, or `None` when the
    /// lifetime does not fit in a timestamp
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Holds and refreshes OAuth credentials for one API account
pub struct AuthManager {
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: String,
    scope: String,
    credentials: Option<Credentials>,
    issued_at: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl AuthManager {
    pub fn new(config: &AppstoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            scope: config.scope.clone(),
            credentials: None,
            issued_at: None,
            clock,
        }
    }

    /// Current credentials, valid or not
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// When the current credentials were issued
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    /// Bearer token of the current credentials
    pub fn access_token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.access_token.as_str())
    }

    /// True when there are no credentials or they have expired.
    ///
    /// A token issued at `t` with lifetime `n` is valid strictly before `t + n`.
    pub fn needs_authentication(&self) -> bool {
        match (&self.credentials, self.issued_at) {
            (Some(credentials), Some(issued_at)) => credentials
                .expires_at(issued_at)
                .map_or(true, |expires_at| self.clock.now() >= expires_at),
            _ => true,
        }
    }

    /// Drop the current credentials
    pub fn invalidate(&mut self) {
        self.credentials = None;
        self.issued_at = None;
    }

    /// Return the current credentials, exchanging for new ones only if needed
    pub async fn authenticate_if_needed(
        &mut self,
        builder: &RequestBuilder,
        transport: &dyn HttpTransport,
    ) -> Result<&Credentials> {
        if self.needs_authentication() {
            return self.authenticate(builder, transport).await;
        }
        debug!("reusing cached credentials");
        self.credentials
            .as_ref()
            .ok_or_else(AppstoreError::requires_authentication)
    }

    /// Exchange the client ID and secret for new credentials
    pub async fn authenticate(
        &mut self,
        builder: &RequestBuilder,
        transport: &dyn HttpTransport,
    ) -> Result<&Credentials> {
        let client_id = non_empty(&self.client_id).ok_or_else(|| {
            AppstoreError::Configuration("client_id is required to authenticate".to_string())
        })?;
        let client_secret = non_empty(&self.client_secret).ok_or_else(|| {
            AppstoreError::Configuration("client_secret is required to authenticate".to_string())
        })?;

        let body = RequestBody::form([
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ]);
        let token_url = Url::parse(&self.token_url)?;
        let request = builder.build(token_url, Verb::Post, body, &HeaderMap::new())?;

        debug!(token_url = %self.token_url, "requesting access token");
        let response = transport.execute(request).await.map_err(|e| match e {
            AppstoreError::Api { status, body } => {
                AppstoreError::Authentication(format!("token exchange failed: {} - {}", status, body))
            }
            other => other,
        })?;

        let body = response.body.ok_or_else(|| {
            AppstoreError::Authentication("token exchange returned an empty body".to_string())
        })?;
        let credentials: Credentials = serde_json::from_value(body)?;

        let issued_at = self.clock.now();
        if credentials.expires_at(issued_at).is_none() {
            return Err(AppstoreError::Authentication(format!(
                "token lifetime out of range: {}s",
                credentials.expires_in
            )));
        }

        self.issued_at = Some(issued_at);
        let credentials: &Credentials = self.credentials.insert(credentials);
        info!(
            token_type = %credentials.token_type,
            expires_in = credentials.expires_in,
            "authenticated"
        );
        Ok(credentials)
    }
}

impl fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthManager")
            .field("client_id", &self.client_id)
            .field("token_url", &self.token_url)
            .field("credentials", &self.credentials)
            .field("issued_at", &self.issued_at)
            .finish_non_exhaustive()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_clock {
    use super::*;
    use std::sync::Mutex;

    /// Manually advanced clock
    pub(crate) struct FixedClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        pub(crate) fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(now),
            })
        }

        pub(crate) fn advance(&self, seconds: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::seconds(seconds);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::FixedClock;
    use super::*;
    use crate::config::DEFAULT_TOKEN_URL;
    use crate::request::Payload;
    use crate::transport::mock::MockTransport;
    use chrono::TimeZone;
    use serde_json::json;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn token_response(token: &str) -> serde_json::Value {
        json!({
            "access_token": token,
            "token_type": "bearer",
            "scope": "appstore::apps:readwrite",
            "expires_in": 3600
        })
    }

    fn manager(clock: Arc<FixedClock>) -> AuthManager {
        AuthManager::new(&AppstoreConfig::new("X", "Y"), clock)
    }

    #[tokio::test]
    async fn test_fresh_manager_exchanges_credentials() {
        let transport = MockTransport::new();
        transport.respond(Some(token_response("abc")), None);
        let mut auth = manager(FixedClock::at(start()));
        assert!(auth.needs_authentication());

        let credentials = auth
            .authenticate_if_needed(&RequestBuilder::default(), &transport)
            .await
            .unwrap();
        assert_eq!(credentials.access_token, "abc");
        assert_eq!(credentials.expires_in, 3600);
        assert!(!auth.needs_authentication());
        assert_eq!(auth.issued_at(), Some(start()));

        let request = transport.last_request();
        assert_eq!(request.verb, Verb::Post);
        assert_eq!(request.url.as_str(), DEFAULT_TOKEN_URL);
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        let Payload::Bytes(bytes) = request.payload else {
            panic!("expected form payload");
        };
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(&bytes)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("client_id".to_string(), "X".to_string()),
                ("client_secret".to_string(), "Y".to_string()),
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("scope".to_string(), "appstore::apps:readwrite".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_valid_credentials_are_reused() {
        let transport = MockTransport::new();
        transport.respond(Some(token_response("abc")), None);
        let clock = FixedClock::at(start());
        let mut auth = manager(clock.clone());
        let builder = RequestBuilder::default();

        auth.authenticate(&builder, &transport).await.unwrap();
        clock.advance(3599);
        let credentials = auth.authenticate_if_needed(&builder, &transport).await.unwrap();

        assert_eq!(credentials.access_token, "abc");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let transport = MockTransport::new();
        transport.respond(Some(token_response("abc")), None);
        let clock = FixedClock::at(start());
        let mut auth = manager(clock.clone());

        auth.authenticate(&RequestBuilder::default(), &transport)
            .await
            .unwrap();

        clock.advance(3599);
        assert!(!auth.needs_authentication());
        clock.advance(1);
        assert!(auth.needs_authentication());
    }

    #[tokio::test]
    async fn test_reauthentication_replaces_credentials() {
        let transport = MockTransport::new();
        transport
            .respond(Some(token_response("first")), None)
            .respond(
                Some(json!({"access_token": "second", "token_type": "bearer", "expires_in": 60})),
                None,
            );
        let clock = FixedClock::at(start());
        let mut auth = manager(clock.clone());
        let builder = RequestBuilder::default();

        auth.authenticate(&builder, &transport).await.unwrap();
        clock.advance(10);
        auth.authenticate(&builder, &transport).await.unwrap();

        let credentials = auth.credentials().unwrap();
        assert_eq!(credentials.access_token, "second");
        assert_eq!(credentials.scope, "");
        assert_eq!(credentials.expires_in, 60);
        assert_eq!(auth.issued_at(), Some(start() + Duration::seconds(10)));
    }

    #[tokio::test]
    async fn test_missing_client_credentials() {
        let transport = MockTransport::new();
        let mut config = AppstoreConfig::new("X", "");
        let mut auth = AuthManager::new(&config, FixedClock::at(start()));

        let err = auth
            .authenticate(&RequestBuilder::default(), &transport)
            .await
            .unwrap_err();
        assert!(matches!(err, AppstoreError::Configuration(_)));

        config.client_id = None;
        config.client_secret = Some("Y".to_string());
        let mut auth = AuthManager::new(&config, FixedClock::at(start()));
        let err = auth
            .authenticate(&RequestBuilder::default(), &transport)
            .await
            .unwrap_err();
        assert!(matches!(err, AppstoreError::Configuration(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_exchange_is_authentication_error() {
        let transport = MockTransport::new();
        transport.fail(401, "{\"error\":\"invalid_client\"}");
        let mut auth = manager(FixedClock::at(start()));

        let err = auth
            .authenticate(&RequestBuilder::default(), &transport)
            .await
            .unwrap_err();
        match err {
            AppstoreError::Authentication(message) => assert!(message.contains("invalid_client")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(auth.needs_authentication());
    }

    #[tokio::test]
    async fn test_oversized_lifetime_is_rejected() {
        let transport = MockTransport::new();
        transport
            .respond(Some(token_response("abc")), None)
            .respond(
                Some(json!({"access_token": "huge", "token_type": "bearer", "expires_in": i64::MAX})),
                None,
            );
        let mut auth = manager(FixedClock::at(start()));
        let builder = RequestBuilder::default();

        auth.authenticate(&builder, &transport).await.unwrap();
        let err = auth.authenticate(&builder, &transport).await.unwrap_err();

        assert!(matches!(err, AppstoreError::Authentication(ref m) if m.contains("out of range")));
        assert_eq!(auth.access_token(), Some("abc"));
        assert!(!auth.needs_authentication());
    }

    #[test]
    fn test_expires_at_overflow_is_none() {
        let credentials = Credentials {
            access_token: "abc".to_string(),
            token_type: "bearer".to_string(),
            scope: String::new(),
            expires_in: i64::MAX,
        };
        assert_eq!(credentials.expires_at(start()), None);
        assert_eq!(
            Credentials { expires_in: 60, ..credentials }.expires_at(start()),
            Some(start() + Duration::seconds(60))
        );
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_exchange() {
        let transport = MockTransport::new();
        transport
            .respond(Some(token_response("first")), None)
            .respond(Some(token_response("second")), None);
        let mut auth = manager(FixedClock::at(start()));
        let builder = RequestBuilder::default();

        auth.authenticate_if_needed(&builder, &transport).await.unwrap();
        auth.invalidate();
        assert!(auth.needs_authentication());
        assert!(auth.credentials().is_none());

        let credentials = auth.authenticate_if_needed(&builder, &transport).await.unwrap();
        assert_eq!(credentials.access_token, "second");
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let credentials = Credentials {
            access_token: "secret-token".to_string(),
            token_type: "bearer".to_string(),
            scope: String::new(),
            expires_in: 3600,
        };
        assert!(!format!("{:?}", credentials).contains("secret-token"));
    }
}
