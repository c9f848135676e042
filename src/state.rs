use crate::backend::BackendClient;
use crate::config::Settings;
use crate::errors::HabitError;
use crate::grid::HabitGridController;
use crate::models::User;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "pyp_session";
const SESSION_IDLE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Default)]
pub struct SessionData {
    pub user: Option<User>,
    /// Address the OTP flow is resetting, kept between its steps.
    pub reset_email: Option<String>,
    pub otp_verified: bool,
    pub flash: Option<String>,
}

/// One browser's visit: its own backend cookie, garden and flash.
pub struct Session {
    pub backend: BackendClient,
    pub grid: Mutex<HabitGridController<BackendClient>>,
    pub data: Mutex<SessionData>,
}

impl Session {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            grid: Mutex::new(HabitGridController::new(backend.clone())),
            backend,
            data: Mutex::new(SessionData::default()),
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.data.lock().await.user.is_some()
    }

    pub async fn flash(&self, message: impl Into<String>) {
        self.data.lock().await.flash = Some(message.into());
    }

    pub async fn take_flash(&self) -> Option<String> {
        self.data.lock().await.flash.take()
    }

    /// Drops the user, the cookie and the cached garden.
    pub async fn end(&self) {
        self.backend.clear_session();
        self.grid.lock().await.reset();
        let mut data = self.data.lock().await;
        data.user = None;
        data.reset_email = None;
        data.otp_verified = false;
    }

    /// Ends the session when the backend reports it expired.
    ///
    /// Callers must not hold the grid lock.
    pub async fn settle<T>(&self, result: Result<T, HabitError>) -> Result<T, HabitError> {
        if let Err(HabitError::SessionExpired) = &result {
            info!("session expired, clearing local state");
            self.end().await;
        }
        result
    }
}

struct Entry {
    session: Arc<Session>,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Finds the session behind a browser cookie, opening a new one when the
    /// cookie is missing or no longer known. The id is returned only for a
    /// new session, so the caller knows to set the cookie.
    pub async fn resolve(
        &self,
        cookie: Option<&str>,
    ) -> Result<(Arc<Session>, Option<String>), HabitError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(id) = cookie {
            if let Some(entry) = sessions.get_mut(id) {
                if entry.last_seen.elapsed() < SESSION_IDLE {
                    entry.last_seen = Instant::now();
                    return Ok((Arc::clone(&entry.session), None));
                }
            }
        }

        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < SESSION_IDLE);
        if sessions.len() < before {
            debug!(dropped = before - sessions.len(), "pruned idle sessions");
        }

        let session = Arc::new(Session::new(BackendClient::new(&self.settings)?));
        let id = Uuid::new_v4().simple().to_string();
        sessions.insert(
            id.clone(),
            Entry {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        debug!(open = sessions.len(), "opened browser session");
        Ok((session, Some(id)))
    }
}
