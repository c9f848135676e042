use crate::errors::AppError;
use crate::handlers;
use crate::state::{AppState, SESSION_COOKIE};
use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tracing::warn;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/signup", get(handlers::signup_page).post(handlers::signup))
        .route(
            "/forgot-password",
            get(handlers::forgot_password_page).post(handlers::forgot_password),
        )
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/reset-password", post(handlers::reset_password))
        .route("/habits", post(handlers::add_habit))
        .route("/habits/:slot/edit", post(handlers::edit_habit))
        .route("/habits/:slot/delete", post(handlers::delete_habit))
        .route("/habits/:slot/track", post(handlers::track_habit))
        .route("/garden/clear", post(handlers::clear_garden))
        .route("/api/garden", get(handlers::api_garden))
        .route("/api/habits", post(handlers::api_add_habit))
        .route(
            "/api/habits/:slot",
            put(handlers::api_edit_habit).delete(handlers::api_delete_habit),
        )
        .route("/api/habits/:slot/complete", post(handlers::api_complete_habit))
        .route("/api/habits/:slot/completions", get(handlers::api_history))
        .layer(middleware::from_fn_with_state(state.clone(), attach_session))
        .with_state(state)
}

/// Hands every request the session named by its cookie.
async fn attach_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie = session_cookie(request.headers());
    let (session, issued) = match state.resolve(cookie.as_deref()).await {
        Ok(resolved) => resolved,
        Err(err) => {
            warn!(error = %err, "could not open a session");
            return AppError::from(err).into_response();
        }
    };
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    if let Some(id) = issued {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "session cookie not sent"),
        }
    }
    response
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}
