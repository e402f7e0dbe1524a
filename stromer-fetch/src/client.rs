//! Stromer portal client.
//!
//! [`StromerClient`] owns the network session, the bearer token and the
//! endpoint dialect of one account. Calls are strictly sequential; nothing
//! here spawns tasks.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use stromer_core::{BikeSnapshot, BikeSummary, Credentials, FieldCategory, LightMode};
use tracing::{debug, info, info_span, instrument, warn, Span};
use url::Url;

use crate::api::BikeApi;
use crate::auth::{self, AuthState};
use crate::endpoints::Endpoints;
use crate::error::ApiError;
use crate::http::{HttpSession, DEFAULT_TIMEOUT_SECS};

// ============================================================================
// Session
// ============================================================================

/// An authenticated session: cookie jar plus bearer token.
struct Session {
    http: HttpSession,
    token: String,
}

/// `{"data": [...]}` wrapper around every resource payload.
#[derive(Debug, Deserialize)]
struct Envelope {
    data: Vec<Value>,
}

// ============================================================================
// Client
// ============================================================================

/// Client for one Stromer portal account.
///
/// ```ignore
/// let creds = Credentials::new("rider@example.com", "secret", "client-id", None);
/// let mut client = StromerClient::new(creds);
/// client.connect().await?;
/// for bike in client.detect_bikes().await? {
///     let snapshot = client.poll(&bike.id).await?;
///     println!("{}: {:?}%", bike.nickname, snapshot.battery_soc());
/// }
/// ```
pub struct StromerClient {
    credentials: Credentials,
    endpoints: Endpoints,
    timeout: Duration,
    session: Option<Session>,
    auth_state: AuthState,
    span: Span,
}

impl StromerClient {
    /// Creates a client for the production portal.
    pub fn new(credentials: Credentials) -> Self {
        let endpoints = Endpoints::new(credentials.dialect());
        Self::with_endpoints(credentials, endpoints)
    }

    /// Creates a client talking to a custom host.
    ///
    /// # Errors
    ///
    /// Fails if `base_url` is not an absolute URL.
    pub fn with_base_url(credentials: Credentials, base_url: &str) -> Result<Self, ApiError> {
        let endpoints = Endpoints::with_base_url(credentials.dialect(), base_url)?;
        Ok(Self::with_endpoints(credentials, endpoints))
    }

    fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        let span = info_span!("stromer", dialect = %endpoints.dialect());
        Self {
            credentials,
            endpoints,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session: None,
            auth_state: AuthState::Unauthenticated,
            span,
        }
    }

    /// Sets the total timeout applied to every request.
    ///
    /// Takes effect on the next [`connect`](Self::connect).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the span all client activity is recorded under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The endpoint table in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Current login state.
    pub fn auth_state(&self) -> AuthState {
        self.auth_state
    }

    /// Returns true if a session with a token exists.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Opens a fresh session and runs the login sequence.
    ///
    /// Any previous session is dropped first, so a failed reconnect leaves
    /// the client disconnected rather than holding a stale token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] if a login step fails, or a
    /// transient error if the portal cannot be reached.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn connect(&mut self) -> Result<bool, ApiError> {
        self.session = None;
        self.auth_state = AuthState::Unauthenticated;

        let http = HttpSession::with_timeout(self.timeout)?;
        let auth_state = &mut self.auth_state;
        let token = auth::login(&http, &self.endpoints, &self.credentials, |state| {
            debug!(?state, "Login state changed");
            *auth_state = state;
        })
        .await?;

        self.session = Some(Session { http, token });
        self.auth_state = AuthState::Authenticated;
        info!("Connected to Stromer portal");
        Ok(true)
    }

    /// Drops the session and token.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn disconnect(&mut self) {
        if self.session.take().is_some() {
            info!("Disconnected from Stromer portal");
        }
        self.auth_state = AuthState::Unauthenticated;
    }

    fn session(&self) -> Result<&Session, ApiError> {
        self.session.as_ref().ok_or(ApiError::NotConnected)
    }

    /// Endpoint label for logs and errors: the path below the resource prefix.
    fn endpoint_label(&self, url: &Url) -> String {
        let path = url.path();
        path.strip_prefix(self.endpoints.resource_prefix())
            .unwrap_or(path)
            .to_string()
    }

    // ========================================================================
    // Resource calls
    // ========================================================================

    async fn call_api(&self, url: &Url, query: &[(&str, &str)]) -> Result<Vec<Value>, ApiError> {
        let session = self.session()?;
        let endpoint = self.endpoint_label(url);

        let res = session.http.get_with_auth(url, &session.token, query).await?;
        let status = res.status();
        debug!(endpoint = %endpoint, status = status.as_u16(), "API call status");
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = res.text().await.map_err(|e| ApiError::request(&endpoint, &e))?;
        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| ApiError::invalid(&endpoint, format!("malformed JSON: {e}")))?;
        Ok(envelope.data)
    }

    async fn call_api_first(&self, url: &Url, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.call_api(url, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::invalid(&self.endpoint_label(url), "empty data array"))
    }

    /// Lists every bike on the account, in portal order.
    ///
    /// # Errors
    ///
    /// Fails when not connected, on HTTP failure, or on an unusable payload.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn detect_bikes(&self) -> Result<Vec<BikeSummary>, ApiError> {
        let url = self.endpoints.bikes();
        let bikes = self
            .call_api(&url, &[])
            .await?
            .iter()
            .map(BikeSummary::from_listing_entry)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::invalid(&self.endpoint_label(&url), e.to_string()))?;

        info!(count = bikes.len(), "Detected bikes");
        Ok(bikes)
    }

    /// Fetches base attributes, status and position of one bike.
    ///
    /// The three calls run in order; any failure fails the whole poll.
    ///
    /// # Errors
    ///
    /// Fails when not connected, on HTTP failure, on an unusable payload, or
    /// if the bike is not on the account.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn poll(&self, bike_id: &str) -> Result<BikeSnapshot, ApiError> {
        let listing_url = self.endpoints.bikes();
        let base = self
            .call_api(&listing_url, &[])
            .await?
            .into_iter()
            .find(|entry| {
                BikeSummary::from_listing_entry(entry).is_ok_and(|bike| bike.id == bike_id)
            })
            .ok_or_else(|| {
                ApiError::invalid(
                    &self.endpoint_label(&listing_url),
                    format!("bike {bike_id} not on account"),
                )
            })?;

        let state_url = self.endpoints.state(bike_id);
        let status = self
            .call_api_first(&state_url, &[("cached", "false")])
            .await?;
        let position_url = self.endpoints.position(bike_id);
        let position = self.call_api_first(&position_url, &[]).await?;

        let snapshot = BikeSnapshot::from_payloads(&base, &status, &position).map_err(|e| {
            let url = match e.category() {
                Some(FieldCategory::Status) => &state_url,
                Some(FieldCategory::Position) => &position_url,
                Some(FieldCategory::Base) | None => &listing_url,
            };
            ApiError::invalid(&self.endpoint_label(url), e.to_string())
        })?;
        debug!(fields = snapshot.len(), "Bike polled");
        Ok(snapshot)
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Locks or unlocks the bike.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Action`] unless the portal answers 2xx.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn set_lock(&self, bike_id: &str, locked: bool) -> Result<(), ApiError> {
        let session = self.session()?;
        let res = session
            .http
            .post_json_with_auth(&self.endpoints.settings(bike_id), &session.token, &json!({ "lock": locked }))
            .await?;
        expect_success("lock", res.status())?;
        info!(locked, "Lock state sent");
        Ok(())
    }

    /// Switches the light on or off.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Action`] unless the portal answers 2xx.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn set_light(&self, bike_id: &str, mode: LightMode) -> Result<(), ApiError> {
        let session = self.session()?;
        let res = session
            .http
            .post_json_with_auth(&self.endpoints.light(bike_id), &session.token, &json!({ "mode": mode.as_str() }))
            .await?;
        expect_success("light", res.status())?;
        info!(%mode, "Light mode sent");
        Ok(())
    }

    /// Clears the trip counters.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Action`] unless the portal answers exactly
    /// `204 No Content`.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn reset_trip_data(&self, bike_id: &str) -> Result<(), ApiError> {
        let session = self.session()?;
        let res = session
            .http
            .delete_with_auth(&self.endpoints.trip_data(bike_id), &session.token)
            .await?;
        if res.status() != StatusCode::NO_CONTENT {
            warn!(status = res.status().as_u16(), "Trip data reset rejected");
            return Err(ApiError::Action {
                action: "reset trip data",
                status: res.status().as_u16(),
            });
        }
        info!("Trip data reset");
        Ok(())
    }
}

fn expect_success(action: &'static str, status: StatusCode) -> Result<(), ApiError> {
    if status.is_success() {
        Ok(())
    } else {
        warn!(action, status = status.as_u16(), "Action rejected");
        Err(ApiError::Action {
            action,
            status: status.as_u16(),
        })
    }
}

impl std::fmt::Debug for StromerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StromerClient")
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .field("timeout", &self.timeout)
            .field("connected", &self.session.is_some())
            .field("auth_state", &self.auth_state)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BikeApi
// ============================================================================

#[async_trait]
impl BikeApi for StromerClient {
    async fn connect(&mut self) -> Result<bool, ApiError> {
        StromerClient::connect(self).await
    }

    async fn disconnect(&mut self) {
        StromerClient::disconnect(self).await;
    }

    async fn detect_bikes(&self) -> Result<Vec<BikeSummary>, ApiError> {
        StromerClient::detect_bikes(self).await
    }

    async fn poll(&self, bike_id: &str) -> Result<BikeSnapshot, ApiError> {
        StromerClient::poll(self, bike_id).await
    }

    async fn set_lock(&self, bike_id: &str, locked: bool) -> Result<(), ApiError> {
        StromerClient::set_lock(self, bike_id, locked).await
    }

    async fn set_light(&self, bike_id: &str, mode: LightMode) -> Result<(), ApiError> {
        StromerClient::set_light(self, bike_id, mode).await
    }

    async fn reset_trip_data(&self, bike_id: &str) -> Result<(), ApiError> {
        StromerClient::reset_trip_data(self, bike_id).await
    }
}
