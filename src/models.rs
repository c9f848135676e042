use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion flag as reported by the backend.
///
/// The backend only sets the flag that matches a habit's frequency, and a
/// freshly created habit carries neither. A missing or null field is
/// `Unknown`, which callers must treat as "not yet completed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    Done,
    NotDone,
    #[default]
    Unknown,
}

impl Completion {
    pub fn is_done(self) -> bool {
        self == Completion::Done
    }
}

impl From<Option<bool>> for Completion {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Completion::Done,
            Some(false) => Completion::NotDone,
            None => Completion::Unknown,
        }
    }
}

impl Serialize for Completion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Completion::Done => serializer.serialize_bool(true),
            Completion::NotDone => serializer.serialize_bool(false),
            Completion::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Completion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<bool>::deserialize(deserializer).map(Completion::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantState {
    Flourishing,
    Wilting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    #[serde(rename = "habit_id", alias = "id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "habit_name", alias = "name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_frequency")]
    pub frequency: Frequency,
    #[serde(rename = "is_completed_today", alias = "completedToday", default)]
    pub completed_today: Completion,
    #[serde(rename = "is_completed_this_week", alias = "completedThisWeek", default)]
    pub completed_this_week: Completion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_state: Option<PlantState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watered: Option<String>,
}

impl Habit {
    pub fn is_wilting(&self) -> bool {
        self.plant_state == Some(PlantState::Wilting)
    }

    /// Parses `last_watered`, accepting RFC 3339 as well as the offset-less
    /// timestamps the backend writes with `utcnow()`.
    pub fn last_watered_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_watered.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(raw.split('T').next()?, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

// Older backend revisions emit numeric ids.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

// The backend stores whatever frequency it was sent, so stored rows can hold
// null or free text. Those read as daily rather than failing the whole list.
fn lenient_frequency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Frequency, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFrequency {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match RawFrequency::deserialize(deserializer)? {
        RawFrequency::Text(text) if text.trim().eq_ignore_ascii_case("daily") => Frequency::Daily,
        RawFrequency::Text(text) if text.trim().eq_ignore_ascii_case("weekly") => Frequency::Weekly,
        RawFrequency::Text(text) => {
            warn!(frequency = %text, "unknown habit frequency, reading as daily");
            Frequency::Daily
        }
        RawFrequency::Other(_) => {
            warn!("habit frequency is not text, reading as daily");
            Frequency::Daily
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, deserialize_with = "optional_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitRequest {
    pub habit_name: String,
    pub frequency: Frequency,
}

#[derive(Debug, Deserialize)]
pub struct HabitListResponse {
    #[serde(default)]
    pub habits: Vec<Habit>,
}

#[derive(Debug, Deserialize)]
pub struct HabitResponse {
    pub habit: Habit,
}

#[derive(Debug, Deserialize)]
pub struct CompleteResponse {
    pub habit: Habit,
    #[serde(default)]
    pub already_completed: bool,
    #[serde(default)]
    pub revived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    #[serde(default)]
    pub completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub period_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionHistory {
    #[serde(deserialize_with = "id_string")]
    pub habit_id: String,
    #[serde(default, deserialize_with = "lenient_frequency")]
    pub frequency: Frequency,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
    #[serde(default)]
    pub total_completions: usize,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn habit_reads_canonical_fields() {
        let habit: Habit = serde_json::from_value(json!({
            "habit_id": "h-1",
            "habit_name": "Read",
            "frequency": "weekly",
            "is_completed_this_week": true,
            "plant_state": "wilting"
        }))
        .unwrap();

        assert_eq!(habit.id, "h-1");
        assert_eq!(habit.name, "Read");
        assert_eq!(habit.frequency, Frequency::Weekly);
        assert_eq!(habit.completed_this_week, Completion::Done);
        assert_eq!(habit.completed_today, Completion::Unknown);
        assert!(habit.is_wilting());
    }

    #[test]
    fn habit_accepts_drifted_names_and_numeric_ids() {
        let habit: Habit = serde_json::from_value(json!({
            "id": 42,
            "name": "Stretch",
            "completedToday": false
        }))
        .unwrap();

        assert_eq!(habit.id, "42");
        assert_eq!(habit.name, "Stretch");
        assert_eq!(habit.frequency, Frequency::Daily);
        assert_eq!(habit.completed_today, Completion::NotDone);
    }

    #[test]
    fn odd_frequencies_read_as_daily() {
        for raw in [json!(null), json!("monthly"), json!(3)] {
            let habit: Habit = serde_json::from_value(json!({
                "habit_id": "legacy",
                "habit_name": "Legacy",
                "frequency": raw
            }))
            .unwrap();
            assert_eq!(habit.frequency, Frequency::Daily);
        }

        let habit: Habit = serde_json::from_value(json!({
            "habit_id": "h-5",
            "habit_name": "Hike",
            "frequency": " Weekly "
        }))
        .unwrap();
        assert_eq!(habit.frequency, Frequency::Weekly);
    }

    #[test]
    fn null_flag_is_unknown() {
        let habit: Habit = serde_json::from_value(json!({
            "habit_id": "h-2",
            "habit_name": "Walk",
            "is_completed_today": null
        }))
        .unwrap();
        assert_eq!(habit.completed_today, Completion::Unknown);
    }

    #[test]
    fn habit_serializes_canonical_names() {
        let habit = Habit {
            id: "h-3".into(),
            name: "Journal".into(),
            frequency: Frequency::Daily,
            completed_today: Completion::Done,
            completed_this_week: Completion::Unknown,
            plant_state: None,
            last_watered: None,
        };
        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["habit_id"], "h-3");
        assert_eq!(value["habit_name"], "Journal");
        assert_eq!(value["is_completed_today"], true);
        assert!(value["is_completed_this_week"].is_null());
    }

    #[test]
    fn last_watered_parses_naive_and_offset_timestamps() {
        let mut habit: Habit = serde_json::from_value(json!({
            "habit_id": "h-4",
            "habit_name": "Water",
            "last_watered": "2026-01-05T08:30:00.123456"
        }))
        .unwrap();
        let naive = habit.last_watered_at().expect("naive timestamp");
        assert_eq!(naive.to_rfc3339(), "2026-01-05T08:30:00.123456+00:00");

        habit.last_watered = Some("2026-01-05T10:30:00+02:00".into());
        let offset = habit.last_watered_at().expect("offset timestamp");
        assert_eq!(offset.to_rfc3339(), "2026-01-05T08:30:00+00:00");

        habit.last_watered = Some("not a date".into());
        assert!(habit.last_watered_at().is_none());
    }
}
