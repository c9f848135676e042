use crate::config::Settings;
use crate::errors::HabitError;
use crate::grid::HabitStore;
use crate::models::{
    CompleteResponse, CompletionHistory, ForgotPasswordRequest, ForgotPasswordResponse,
    Frequency, Habit, HabitListResponse, HabitRequest, HabitResponse, LoginRequest,
    LoginResponse, MessageBody, ResetPasswordRequest, SignupRequest, User, VerifyOtpRequest,
};
use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode, Url,
    cookie::{CookieStore, Jar},
    header::HeaderValue,
};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Whether a 401 on a call means the session cookie is no longer valid.
///
/// Auth endpoints answer 401 for bad credentials, which is not an expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Session,
    Credentials,
}

/// Cookie jar that can be emptied when the backend session ends.
#[derive(Default)]
pub struct SessionJar {
    inner: RwLock<Jar>,
}

impl SessionJar {
    pub fn clear(&self) {
        if let Ok(mut jar) = self.inner.write() {
            *jar = Jar::default();
        }
    }

    pub fn has_cookies_for(&self, url: &Url) -> bool {
        self.cookies(url).is_some()
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if let Ok(jar) = self.inner.read() {
            jar.set_cookies(cookie_headers, url);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.inner.read().ok()?.cookies(url)
    }
}

/// Typed client for the Pot Your Progress REST backend.
///
/// Cloning is cheap and clones share the same session cookie.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    jar: Arc<SessionJar>,
}

impl BackendClient {
    pub fn new(settings: &Settings) -> Result<Self, HabitError> {
        let jar = Arc::new(SessionJar::default());
        let mut builder = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(settings.request_timeout);
        if is_loopback(&settings.backend_url) {
            builder = builder.no_proxy();
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.backend_url.trim_end_matches('/').to_string(),
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_session(&self) -> bool {
        Url::parse(&self.base_url)
            .map(|url| self.jar.has_cookies_for(&url))
            .unwrap_or(false)
    }

    pub fn clear_session(&self) {
        self.jar.clear();
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, HabitError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let body: LoginResponse = self.decode(response, Scope::Credentials).await?;
        Ok(body.user)
    }

    pub async fn logout(&self) -> Result<(), HabitError> {
        let response = self.http.post(self.url("/auth/logout")).send().await;
        self.clear_session();
        self.accept(response?, Scope::Session).await
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), HabitError> {
        let response = self
            .http
            .post(self.url("/auth/signup"))
            .json(&SignupRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        self.accept(response, Scope::Credentials).await
    }

    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<ForgotPasswordResponse, HabitError> {
        let response = self
            .http
            .post(self.url("/auth/forget-password"))
            .json(&ForgotPasswordRequest {
                email: email.to_string(),
            })
            .send()
            .await?;
        self.decode(response, Scope::Credentials).await
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<(), HabitError> {
        let response = self
            .http
            .post(self.url("/auth/verify-otp"))
            .json(&VerifyOtpRequest {
                email: email.to_string(),
                otp: otp.to_string(),
            })
            .send()
            .await?;
        self.accept(response, Scope::Credentials).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), HabitError> {
        let response = self
            .http
            .post(self.url("/auth/reset-password"))
            .json(&ResetPasswordRequest {
                email: email.to_string(),
                new_password: new_password.to_string(),
                confirm_password: confirm_password.to_string(),
            })
            .send()
            .await?;
        self.accept(response, Scope::Credentials).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: Response,
        scope: Scope,
    ) -> Result<T, HabitError> {
        let response = self.check(response, scope).await?;
        let status = response.status();
        response.json::<T>().await.map_err(|err| {
            if !err.is_decode() {
                return HabitError::Fetch(err);
            }
            warn!(status = status.as_u16(), error = %err, "backend sent an unreadable body");
            HabitError::Backend {
                status: status.as_u16(),
                message: "Unexpected response from backend".into(),
            }
        })
    }

    async fn accept(&self, response: Response, scope: Scope) -> Result<(), HabitError> {
        self.check(response, scope).await.map(drop)
    }

    async fn check(&self, response: Response, scope: Scope) -> Result<Response, HabitError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && scope == Scope::Session {
            warn!(url = %response.url(), "backend session expired");
            self.clear_session();
            return Err(HabitError::SessionExpired);
        }

        let body: MessageBody = response.json().await.unwrap_or_default();
        let message = body
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        debug!(status = status.as_u16(), %message, "backend rejected request");
        Err(HabitError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl HabitStore for BackendClient {
    async fn list_habits(&self) -> Result<Vec<Habit>, HabitError> {
        let response = self.http.get(self.url("/habits")).send().await?;
        let body: HabitListResponse = self.decode(response, Scope::Session).await?;
        Ok(body.habits)
    }

    async fn create_habit(&self, name: &str, frequency: Frequency) -> Result<Habit, HabitError> {
        let response = self
            .http
            .post(self.url("/habits"))
            .json(&HabitRequest {
                habit_name: name.to_string(),
                frequency,
            })
            .send()
            .await?;
        let body: HabitResponse = self.decode(response, Scope::Session).await?;
        Ok(body.habit)
    }

    async fn update_habit(
        &self,
        id: &str,
        name: &str,
        frequency: Frequency,
    ) -> Result<Habit, HabitError> {
        let response = self
            .http
            .put(self.url(&format!("/habits/{id}")))
            .json(&HabitRequest {
                habit_name: name.to_string(),
                frequency,
            })
            .send()
            .await?;
        let body: HabitResponse = self.decode(response, Scope::Session).await?;
        Ok(body.habit)
    }

    async fn delete_habit(&self, id: &str) -> Result<(), HabitError> {
        let response = self
            .http
            .delete(self.url(&format!("/habits/{id}")))
            .send()
            .await?;
        self.accept(response, Scope::Session).await
    }

    async fn complete_habit(&self, id: &str) -> Result<CompleteResponse, HabitError> {
        let response = self
            .http
            .post(self.url(&format!("/habits/{id}/complete")))
            .send()
            .await?;
        self.decode(response, Scope::Session).await
    }

    async fn completion_history(
        &self,
        id: &str,
        days: u32,
    ) -> Result<CompletionHistory, HabitError> {
        let response = self
            .http
            .get(self.url(&format!("/habits/{id}/completions")))
            .query(&[("days", days)])
            .send()
            .await?;
        self.decode(response, Scope::Session).await
    }
}

fn is_loopback(base_url: &str) -> bool {
    Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .is_some_and(|host| host == "localhost" || host == "127.0.0.1" || host == "[::1]")
}
