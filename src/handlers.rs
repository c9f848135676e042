use crate::auth::{validate_email, validate_login, validate_otp, validate_reset, validate_signup};
use crate::errors::{AppError, HabitError};
use crate::grid::{GridSlot, is_pending};
use crate::models::{CompletionHistory, Frequency, Habit, HabitRequest, User};
use crate::state::Session;
use crate::stats::{GardenSummary, summarize, wilting_reminder};
use crate::ui::{
    ResetStage, render_forgot_password, render_garden, render_login, render_signup,
};
use axum::{
    Extension, Form, Json,
    extract::{Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_HISTORY_DAYS: u32 = 30;
const EXPIRED_MESSAGE: &str = "Session expired, please log in again";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpForm {
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct HabitForm {
    pub habit_name: String,
    #[serde(default)]
    pub frequency: Frequency,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlotView {
    pub index: usize,
    pub habit: Option<Habit>,
    pub pending: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GardenResponse {
    pub slots: Vec<SlotView>,
    pub summary: GardenSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HabitEnvelope {
    pub habit: Habit,
}

fn garden_view(slots: &[GridSlot]) -> GardenResponse {
    GardenResponse {
        slots: slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotView {
                index,
                habit: slot.habit().cloned(),
                pending: is_pending(slot),
            })
            .collect(),
        summary: summarize(slots),
        reminder: wilting_reminder(slots),
    }
}

fn display_name(user: &User) -> &str {
    user.name
        .as_deref()
        .or(user.email.as_deref())
        .unwrap_or("gardener")
}

/// Flashes the outcome of a garden action and picks where to go next.
async fn finish(session: &Session, result: Result<(), HabitError>, done: &str) -> Redirect {
    match session.settle(result).await {
        Ok(()) => {
            session.flash(done).await;
            Redirect::to("/")
        }
        Err(HabitError::SessionExpired) => {
            session.flash(EXPIRED_MESSAGE).await;
            Redirect::to("/login")
        }
        Err(err) => {
            warn!(error = %err, "garden action failed");
            session.flash(err.to_string()).await;
            Redirect::to("/")
        }
    }
}

async fn require_user(session: &Session) -> Result<(), AppError> {
    if session.is_logged_in().await {
        Ok(())
    } else {
        Err(AppError::unauthorized())
    }
}

pub async fn index(Extension(session): Extension<Arc<Session>>) -> Response {
    let user = session.data.lock().await.user.clone();
    let Some(user) = user else {
        return Redirect::to("/login").into_response();
    };

    let refreshed = session.grid.lock().await.refresh().await.map(|_| ());
    let mut flash = session.take_flash().await;
    match session.settle(refreshed).await {
        Ok(()) => {}
        Err(HabitError::SessionExpired) => {
            session.flash(EXPIRED_MESSAGE).await;
            return Redirect::to("/login").into_response();
        }
        Err(err) => {
            warn!(error = %err, "could not load garden");
            flash = Some(err.to_string());
        }
    }

    let grid = session.grid.lock().await;
    let slots = grid.slots();
    Html(render_garden(
        display_name(&user),
        slots,
        &summarize(slots),
        flash.as_deref(),
    ))
    .into_response()
}

pub async fn login_page(Extension(session): Extension<Arc<Session>>) -> Response {
    if session.is_logged_in().await {
        return Redirect::to("/").into_response();
    }
    let flash = session.take_flash().await;
    Html(render_login(flash.as_deref())).into_response()
}

pub async fn login(
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let result = match validate_login(&form.email, &form.password) {
        Ok((email, password)) => session.backend.login(email, password).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(user) => {
            info!(email = user.email.as_deref().unwrap_or_default(), "logged in");
            session.data.lock().await.user = Some(user);
            Redirect::to("/")
        }
        Err(err) => {
            session.flash(err.to_string()).await;
            Redirect::to("/login")
        }
    }
}

pub async fn logout(Extension(session): Extension<Arc<Session>>) -> Redirect {
    if let Err(err) = session.backend.logout().await {
        warn!(error = %err, "backend logout failed");
    }
    session.end().await;
    session.flash("Logged out").await;
    Redirect::to("/login")
}

pub async fn signup_page(Extension(session): Extension<Arc<Session>>) -> Html<String> {
    let flash = session.take_flash().await;
    Html(render_signup(flash.as_deref()))
}

pub async fn signup(
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<SignupForm>,
) -> Redirect {
    let result = match validate_signup(&form.name, &form.email, &form.password) {
        Ok((name, email, password)) => session.backend.signup(name, email, password).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {
            session.flash("Account created, please log in").await;
            Redirect::to("/login")
        }
        Err(err) => {
            session.flash(err.to_string()).await;
            Redirect::to("/signup")
        }
    }
}

pub async fn forgot_password_page(Extension(session): Extension<Arc<Session>>) -> Html<String> {
    let flash = session.take_flash().await;
    let data = session.data.lock().await;
    let stage = match (&data.reset_email, data.otp_verified) {
        (None, _) => ResetStage::RequestOtp,
        (Some(_), false) => ResetStage::EnterOtp,
        (Some(_), true) => ResetStage::NewPassword,
    };
    Html(render_forgot_password(
        stage,
        data.reset_email.as_deref(),
        flash.as_deref(),
    ))
}

pub async fn forgot_password(
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<EmailForm>,
) -> Redirect {
    let email = match validate_email(&form.email) {
        Ok(email) => email.to_string(),
        Err(err) => {
            session.flash(err.to_string()).await;
            return Redirect::to("/forgot-password");
        }
    };

    match session.backend.forgot_password(&email).await {
        Ok(reply) => {
            let message = match reply.otp {
                Some(otp) => format!("{} Your code is {otp}.", reply.message),
                None => reply.message,
            };
            {
                let mut data = session.data.lock().await;
                data.reset_email = Some(email);
                data.otp_verified = false;
            }
            session.flash(message.trim().to_string()).await;
        }
        Err(err) => session.flash(err.to_string()).await,
    }
    Redirect::to("/forgot-password")
}

pub async fn verify_otp(
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<OtpForm>,
) -> Redirect {
    let email = session.data.lock().await.reset_email.clone();
    let Some(email) = email else {
        session.flash("Request a code first").await;
        return Redirect::to("/forgot-password");
    };

    let result = match validate_otp(&form.otp) {
        Ok(otp) => session.backend.verify_otp(&email, otp).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            session.data.lock().await.otp_verified = true;
            session.flash("Code verified").await;
        }
        Err(err) => session.flash(err.to_string()).await,
    }
    Redirect::to("/forgot-password")
}

pub async fn reset_password(
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<ResetForm>,
) -> Redirect {
    let email = {
        let data = session.data.lock().await;
        match (&data.reset_email, data.otp_verified) {
            (Some(email), true) => Some(email.clone()),
            _ => None,
        }
    };
    let Some(email) = email else {
        session.flash("Verify your code first").await;
        return Redirect::to("/forgot-password");
    };

    let result = match validate_reset(&form.new_password, &form.confirm_password) {
        Ok(()) => {
            session
                .backend
                .reset_password(&email, &form.new_password, &form.confirm_password)
                .await
        }
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            {
                let mut data = session.data.lock().await;
                data.reset_email = None;
                data.otp_verified = false;
            }
            session.flash("Password reset, please log in").await;
            Redirect::to("/login")
        }
        Err(err) => {
            session.flash(err.to_string()).await;
            Redirect::to("/forgot-password")
        }
    }
}

pub async fn add_habit(
    Extension(session): Extension<Arc<Session>>,
    Form(form): Form<HabitForm>,
) -> Redirect {
    if !session.is_logged_in().await {
        return Redirect::to("/login");
    }
    let result = session
        .grid
        .lock()
        .await
        .add(&form.habit_name, form.frequency)
        .await
        .map(drop);
    finish(&session, result, "Habit planted").await
}

pub async fn edit_habit(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
    Form(form): Form<HabitForm>,
) -> Redirect {
    if !session.is_logged_in().await {
        return Redirect::to("/login");
    }
    let result = session
        .grid
        .lock()
        .await
        .edit(slot, &form.habit_name, form.frequency)
        .await
        .map(drop);
    finish(&session, result, "Habit updated").await
}

pub async fn delete_habit(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
) -> Redirect {
    if !session.is_logged_in().await {
        return Redirect::to("/login");
    }
    let result = session.grid.lock().await.remove(slot).await;
    finish(&session, result, "Habit dug up").await
}

pub async fn track_habit(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
) -> Redirect {
    if !session.is_logged_in().await {
        return Redirect::to("/login");
    }
    let result = session.grid.lock().await.track_completion(slot).await.map(drop);
    finish(&session, result, "Watered").await
}

pub async fn clear_garden(Extension(session): Extension<Arc<Session>>) -> Redirect {
    if !session.is_logged_in().await {
        return Redirect::to("/login");
    }
    let result = session.grid.lock().await.clear().await;
    finish(&session, result, "Garden cleared").await
}

pub async fn api_garden(
    Extension(session): Extension<Arc<Session>>,
) -> Result<Json<GardenResponse>, AppError> {
    require_user(&session).await?;
    let result = session.grid.lock().await.refresh().await.map(|slots| garden_view(slots));
    Ok(Json(session.settle(result).await?))
}

pub async fn api_add_habit(
    Extension(session): Extension<Arc<Session>>,
    Json(payload): Json<HabitRequest>,
) -> Result<(StatusCode, Json<HabitEnvelope>), AppError> {
    require_user(&session).await?;
    let result = session
        .grid
        .lock()
        .await
        .add(&payload.habit_name, payload.frequency)
        .await;
    let habit = session.settle(result).await?;
    Ok((StatusCode::CREATED, Json(HabitEnvelope { habit })))
}

pub async fn api_edit_habit(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
    Json(payload): Json<HabitRequest>,
) -> Result<Json<HabitEnvelope>, AppError> {
    require_user(&session).await?;
    let result = session
        .grid
        .lock()
        .await
        .edit(slot, &payload.habit_name, payload.frequency)
        .await;
    let habit = session.settle(result).await?;
    Ok(Json(HabitEnvelope { habit }))
}

pub async fn api_delete_habit(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
) -> Result<StatusCode, AppError> {
    require_user(&session).await?;
    let result = session.grid.lock().await.remove(slot).await;
    session.settle(result).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_complete_habit(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
) -> Result<Json<HabitEnvelope>, AppError> {
    require_user(&session).await?;
    let result = session.grid.lock().await.track_completion(slot).await;
    let habit = session.settle(result).await?;
    Ok(Json(HabitEnvelope { habit }))
}

pub async fn api_history(
    Extension(session): Extension<Arc<Session>>,
    Path(slot): Path<usize>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<CompletionHistory>, AppError> {
    require_user(&session).await?;
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let result = session.grid.lock().await.history(slot, days).await;
    Ok(Json(session.settle(result).await?))
}
