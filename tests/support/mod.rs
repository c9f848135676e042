#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use pot_your_progress::{AppState, Settings};
use serde_json::{Value, json};
use std::{collections::HashMap, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

pub const PASSWORD: &str = "secret";
pub const OTP: &str = "123456";
const SESSION_COOKIE: &str = "session=garden";

#[derive(Default)]
pub struct FakeState {
    pub habits: Vec<Value>,
    pub next_id: u64,
    pub habit_requests: usize,
    pub expired: bool,
    pub garbled: bool,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub async fn seed(&self, names: &[&str]) {
        let mut state = self.state.lock().await;
        for name in names {
            state.next_id += 1;
            let id = format!("h{}", state.next_id);
            state.habits.push(json!({
                "habit_id": id,
                "habit_name": name,
                "frequency": "daily",
                "plant_state": "flourishing",
                "last_watered": null
            }));
        }
    }

    /// Stores a row exactly as given, like one written by an older client.
    pub async fn seed_raw(&self, habit: Value) {
        self.state.lock().await.habits.push(habit);
    }

    /// Makes the list endpoint answer 200 with a body that is not a habit list.
    pub async fn garble(&self) {
        self.state.lock().await.garbled = true;
    }

    pub async fn habit_count(&self) -> usize {
        self.state.lock().await.habits.len()
    }

    pub async fn expire_sessions(&self) {
        self.state.lock().await.expired = true;
    }

    pub async fn habit_requests(&self) -> usize {
        self.state.lock().await.habit_requests
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn signed_in(state: &FakeState, headers: &HeaderMap) -> bool {
    !state.expired
        && headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookies| cookies.contains(SESSION_COOKIE))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != PASSWORD {
        return message(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
        Json(json!({
            "message": "Login successful",
            "user": { "id": 7, "name": "Ada", "email": body["email"] }
        })),
    )
        .into_response()
}

async fn logout() -> Response {
    (
        [(header::SET_COOKIE, "session=; Path=/; Max-Age=0")],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

async fn signup(Json(body): Json<Value>) -> Response {
    if body["email"] == "taken@example.com" {
        return message(StatusCode::CONFLICT, "Email already exists");
    }
    message(StatusCode::CREATED, "User registered successfully")
}

async fn forget_password(Json(_body): Json<Value>) -> Response {
    Json(json!({ "message": "OTP generated", "otp": OTP })).into_response()
}

async fn verify_otp(Json(body): Json<Value>) -> Response {
    if body["otp"] != OTP {
        return message(StatusCode::BAD_REQUEST, "Invalid OTP");
    }
    message(StatusCode::OK, "OTP verified")
}

async fn reset_password(Json(body): Json<Value>) -> Response {
    if body["new_password"] != body["confirm_password"] {
        return message(StatusCode::BAD_REQUEST, "Passwords do not match");
    }
    message(StatusCode::OK, "Password reset successfully")
}

async fn list_habits(State(backend): State<FakeBackend>, headers: HeaderMap) -> Response {
    let mut state = backend.state.lock().await;
    state.habit_requests += 1;
    if !signed_in(&state, &headers) {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if state.garbled {
        return Json(json!({ "habits": "unavailable" })).into_response();
    }
    Json(json!({ "habits": state.habits })).into_response()
}

async fn create_habit(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = backend.state.lock().await;
    state.habit_requests += 1;
    if !signed_in(&state, &headers) {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    if state.habits.len() >= 8 {
        return message(StatusCode::BAD_REQUEST, "Garden is full");
    }
    state.next_id += 1;
    let habit = json!({
        "habit_id": format!("h{}", state.next_id),
        "habit_name": body["habit_name"],
        "frequency": body["frequency"],
        "plant_state": "flourishing",
        "last_watered": null
    });
    state.habits.push(habit.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Habit created successfully", "habit": habit })),
    )
        .into_response()
}

async fn update_habit(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = backend.state.lock().await;
    state.habit_requests += 1;
    if !signed_in(&state, &headers) {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let Some(habit) = state.habits.iter_mut().find(|h| h["habit_id"] == id.as_str()) else {
        return message(StatusCode::NOT_FOUND, "Habit not found");
    };
    habit["habit_name"] = body["habit_name"].clone();
    habit["frequency"] = body["frequency"].clone();
    Json(json!({ "message": "Habit updated successfully", "habit": habit })).into_response()
}

async fn delete_habit(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = backend.state.lock().await;
    state.habit_requests += 1;
    if !signed_in(&state, &headers) {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let before = state.habits.len();
    state.habits.retain(|h| h["habit_id"] != id.as_str());
    if state.habits.len() == before {
        return message(StatusCode::NOT_FOUND, "Habit not found");
    }
    message(StatusCode::OK, "Habit deleted successfully")
}

async fn complete_habit(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = backend.state.lock().await;
    state.habit_requests += 1;
    if !signed_in(&state, &headers) {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let Some(habit) = state.habits.iter_mut().find(|h| h["habit_id"] == id.as_str()) else {
        return message(StatusCode::NOT_FOUND, "Habit not found");
    };
    let field = if habit["frequency"] == "weekly" {
        "is_completed_this_week"
    } else {
        "is_completed_today"
    };
    let already_completed = habit[field] == true;
    let revived = habit["plant_state"] == "wilting";
    habit[field] = json!(true);
    habit["plant_state"] = json!("flourishing");
    habit["last_watered"] = json!("2026-01-05T08:30:00.000000");
    Json(json!({
        "message": "Habit completed successfully",
        "habit": habit,
        "already_completed": already_completed,
        "revived": revived
    }))
    .into_response()
}

async fn completions(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = backend.state.lock().await;
    state.habit_requests += 1;
    if !signed_in(&state, &headers) {
        return message(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    Json(json!({
        "habit_id": id,
        "frequency": "daily",
        "days": query.get("days"),
        "completions": [{
            "completion_date": "2026-01-05",
            "completed_at": "2026-01-05T08:30:00",
            "period_key": "2026-01-05"
        }],
        "total_completions": 1
    }))
    .into_response()
}

pub fn router(backend: FakeBackend) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/signup", post(signup))
        .route("/auth/forget-password", post(forget_password))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/reset-password", post(reset_password))
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/:id", put(update_habit).delete(delete_habit))
        .route("/habits/:id/complete", post(complete_habit))
        .route("/habits/:id/completions", get(completions))
        .with_state(backend)
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Serves the garden front end in-process against `backend_url`.
pub async fn spawn_front_end(backend_url: &str) -> (String, AppState) {
    let settings = Settings {
        backend_url: backend_url.to_string(),
        ..Settings::default()
    };
    let state = AppState::new(settings);
    let url = serve(pot_your_progress::router(state.clone())).await;
    (url, state)
}

pub async fn spawn_backend() -> (String, FakeBackend) {
    let backend = FakeBackend::default();
    let url = serve(router(backend.clone())).await;
    (url, backend)
}
