pub mod dto;

use crate::domain::events::{AuthEvent, SessionNotifier, SessionSubscription};
use crate::domain::model::{Course, Enrollment, NewEnrollment, Session};
use crate::domain::ports::{AuthService, ConfigProvider, CourseRepository};
use crate::utils::error::{EnrollError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Access tokens are renewed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 10;

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token.is_some()
            && self
                .expires_at
                .map(|at| now + Duration::seconds(EXPIRY_MARGIN_SECS) >= at)
                .unwrap_or(false)
    }
}

impl From<dto::TokenResponse> for StoredSession {
    fn from(tokens: dto::TokenResponse) -> Self {
        Self {
            session: Session::new(tokens.user.id, tokens.user.email.unwrap_or_default()),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

/// Client for a Supabase project: GoTrue under `/auth/v1`, PostgREST under
/// `/rest/v1`. Clones share the session.
///
/// Data calls renew the access token when it is about to expire, and retry once
/// with a renewed token when PostgREST answers 401. If renewal is refused the
/// session is dropped and a sign-out is published.
///
/// The HTTP client has no request timeout; whatever the server or the network
/// imposes applies.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    stored: Arc<RwLock<Option<StoredSession>>>,
    notifier: SessionNotifier,
}

impl SupabaseClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.backend_url().trim_end_matches('/').to_string(),
            anon_key: config.anon_key().to_string(),
            stored: Arc::new(RwLock::new(None)),
            notifier: SessionNotifier::new(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// The user's access token when signed in, the anon key otherwise.
    async fn bearer(&self) -> String {
        self.stored
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn with_keys(&self, request: RequestBuilder, bearer: &str) -> RequestBuilder {
        request.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    async fn store(&self, tokens: dto::TokenResponse) -> Session {
        let stored = StoredSession::from(tokens);
        let session = stored.session.clone();
        *self.stored.write().await = Some(stored);
        session
    }

    async fn request_token(&self, grant_type: &str, body: serde_json::Value) -> Result<dto::TokenResponse> {
        let url = self.auth_url("token");
        tracing::debug!("📡 POST {} (grant_type={})", url, grant_type);

        let response = self
            .with_keys(self.client.post(&url), &self.anon_key)
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn send_with_bearer(&self, request: RequestBuilder) -> Result<Response> {
        let bearer = self.bearer().await;
        let response = self.with_keys(request, &bearer).send().await?;
        tracing::debug!("📡 {} -> {}", response.url(), response.status());
        Ok(response)
    }

    fn can_refresh(stored: &Option<StoredSession>) -> bool {
        stored.as_ref().and_then(|s| s.refresh_token.as_ref()).is_some()
    }

    /// Renews the tokens. A refused renewal ends the session.
    async fn renew_session(&self) -> Result<Session> {
        match self.refresh_session().await {
            Ok(session) => Ok(session),
            Err(e @ EnrollError::AuthError { .. }) => {
                tracing::warn!("🔒 Session could not be renewed, signing out: {}", e);
                if self.stored.write().await.take().is_some() {
                    self.notifier.publish(AuthEvent::signed_out());
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn send_data(&self, request: RequestBuilder) -> Result<Response> {
        let expired = self
            .stored
            .read()
            .await
            .as_ref()
            .map(|s| s.needs_refresh(Utc::now()))
            .unwrap_or(false);
        if expired {
            tracing::info!("🔄 Access token expired, renewing session");
            if let Err(e) = self.renew_session().await {
                tracing::warn!("⚠️ Continuing without a renewed token: {}", e);
            }
        }

        let retry = request.try_clone();
        let mut response = self.send_with_bearer(request).await?;

        let rejected = response.status() == StatusCode::UNAUTHORIZED
            && Self::can_refresh(&*self.stored.read().await);
        if let (true, Some(retry)) = (rejected, retry) {
            tracing::info!("🔄 Access token rejected, renewing session");
            self.renew_session().await?;
            response = self.send_with_bearer(retry).await?;
        }

        if !response.status().is_success() {
            return Err(data_error(response).await);
        }
        Ok(response)
    }
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

async fn auth_error(response: Response) -> EnrollError {
    let status = response.status();
    let body: dto::ErrorBody = response.json().await.unwrap_or_default();
    EnrollError::AuthError {
        message: body.auth_message().unwrap_or_else(|| fallback_message(status)),
    }
}

async fn data_error(response: Response) -> EnrollError {
    let status = response.status();
    let body: dto::ErrorBody = response.json().await.unwrap_or_default();
    EnrollError::BackendError {
        status: status.as_u16(),
        message: body.data_message().unwrap_or_else(|| fallback_message(status)),
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let url = self.auth_url("signup");
        tracing::debug!("📡 POST {}", url);

        let response = self
            .with_keys(self.client.post(&url), &self.anon_key)
            .json(&dto::Credentials { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(auth_error(response).await);
        }

        let body: dto::SignUpResponse = response.json().await?;
        match body.into_token_response() {
            Some(tokens) => {
                let session = self.store(tokens).await;
                self.notifier.publish(AuthEvent::signed_in(session.clone()));
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let body = serde_json::to_value(dto::Credentials { email, password })?;
        let tokens = self.request_token("password", body).await?;
        let session = self.store(tokens).await;
        self.notifier.publish(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(stored) = self.stored.write().await.take() else {
            return Ok(());
        };
        self.notifier.publish(AuthEvent::signed_out());

        let url = self.auth_url("logout");
        tracing::debug!("📡 POST {}", url);
        let response = self
            .with_keys(self.client.post(&url), &stored.access_token)
            .send()
            .await?;

        // An already expired or unknown session counts as signed out.
        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(auth_error(response).await),
        }
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.stored.read().await.as_ref().map(|s| s.session.clone()))
    }

    async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .stored
            .read()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| EnrollError::AuthError {
                message: "Auth session missing!".to_string(),
            })?;

        let body = serde_json::to_value(dto::RefreshRequest {
            refresh_token: &refresh_token,
        })?;
        let tokens = self.request_token("refresh_token", body).await?;
        let session = self.store(tokens).await;
        self.notifier.publish(AuthEvent::token_refreshed(session.clone()));
        Ok(session)
    }

    fn subscribe(&self) -> SessionSubscription {
        self.notifier.subscribe()
    }
}

#[async_trait]
impl CourseRepository for SupabaseClient {
    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        let request = self
            .client
            .get(self.rest_url("courses"))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = self.send_data(request).await?;
        Ok(response.json().await?)
    }

    async fn fetch_enrollments(&self, student_id: &str) -> Result<Vec<Enrollment>> {
        let request = self.client.get(self.rest_url("enrollments")).query(&[
            ("select", "*,courses(*)".to_string()),
            ("student_id", format!("eq.{}", student_id)),
        ]);
        let response = self.send_data(request).await?;
        Ok(response.json().await?)
    }

    async fn insert_enrollment(&self, enrollment: &NewEnrollment) -> Result<()> {
        let request = self
            .client
            .post(self.rest_url("enrollments"))
            .header("Prefer", "return=minimal")
            .json(&[enrollment]);
        self.send_data(request).await?;
        Ok(())
    }

    async fn update_available_seats(&self, course_id: &str, available_seats: i32) -> Result<()> {
        let request = self
            .client
            .patch(self.rest_url("courses"))
            .query(&[("id", format!("eq.{}", course_id))])
            .header("Prefer", "return=minimal")
            .json(&dto::SeatUpdate { available_seats });
        self.send_data(request).await?;
        Ok(())
    }
}
