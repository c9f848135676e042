//! The garden grid: eight pots backed by the remote habit list.
//!
//! Slots are a view over the compacted server list, not stable positions.
//! `add`, `remove` and `clear` rebuild the whole array from a fresh fetch;
//! `edit` and `track_completion` patch the one slot they resolved. When the
//! fetch after a committed `add` or `remove` fails, the grid is patched
//! locally instead so it never points at a habit the server has dropped.

use crate::errors::HabitError;
use crate::models::{CompleteResponse, CompletionHistory, Frequency, Habit};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub const CAPACITY: usize = 8;

/// Remote collection of the signed-in user's habits.
#[async_trait]
pub trait HabitStore: Send + Sync {
    async fn list_habits(&self) -> Result<Vec<Habit>, HabitError>;
    async fn create_habit(&self, name: &str, frequency: Frequency) -> Result<Habit, HabitError>;
    async fn update_habit(
        &self,
        id: &str,
        name: &str,
        frequency: Frequency,
    ) -> Result<Habit, HabitError>;
    async fn delete_habit(&self, id: &str) -> Result<(), HabitError>;
    async fn complete_habit(&self, id: &str) -> Result<CompleteResponse, HabitError>;
    async fn completion_history(
        &self,
        id: &str,
        days: u32,
    ) -> Result<CompletionHistory, HabitError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GridSlot {
    #[default]
    Empty,
    Occupied(Habit),
}

impl GridSlot {
    pub fn habit(&self) -> Option<&Habit> {
        match self {
            GridSlot::Empty => None,
            GridSlot::Occupied(habit) => Some(habit),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GridSlot::Empty)
    }
}

/// Whether the pot should offer its "water" action.
///
/// Only an explicit `true` from the backend counts as completed; an unknown
/// flag is pending so new habits can be watered right away.
pub fn is_pending(slot: &GridSlot) -> bool {
    match slot {
        GridSlot::Empty => false,
        GridSlot::Occupied(habit) => is_habit_pending(habit),
    }
}

pub fn is_habit_pending(habit: &Habit) -> bool {
    let flag = match habit.frequency {
        Frequency::Daily => habit.completed_today,
        Frequency::Weekly => habit.completed_this_week,
    };
    !flag.is_done()
}

/// Truncates to [`CAPACITY`] and pads with empty slots.
pub fn layout(habits: Vec<Habit>) -> [GridSlot; CAPACITY] {
    let mut slots: [GridSlot; CAPACITY] = Default::default();
    for (slot, habit) in slots.iter_mut().zip(habits) {
        *slot = GridSlot::Occupied(habit);
    }
    slots
}

pub fn validate_habit_name(name: &str) -> Result<String, HabitError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(HabitError::validation("Habit name is required"));
    }
    Ok(trimmed.to_string())
}

pub struct HabitGridController<S> {
    store: S,
    slots: [GridSlot; CAPACITY],
}

impl<S: HabitStore> HabitGridController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            slots: Default::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn slots(&self) -> &[GridSlot; CAPACITY] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&GridSlot> {
        self.slots.get(index)
    }

    pub fn habits(&self) -> impl Iterator<Item = &Habit> {
        self.slots.iter().filter_map(GridSlot::habit)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_empty())
    }

    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    pub async fn refresh(&mut self) -> Result<&[GridSlot; CAPACITY], HabitError> {
        let habits = self.store.list_habits().await?;
        if habits.len() > CAPACITY {
            debug!(total = habits.len(), "garden holds more habits than pots");
        }
        self.slots = layout(habits);
        Ok(&self.slots)
    }

    pub async fn add(&mut self, name: &str, frequency: Frequency) -> Result<Habit, HabitError> {
        let name = validate_habit_name(name)?;
        let habit = self.store.create_habit(&name, frequency).await?;
        info!(habit_id = %habit.id, %frequency, "habit planted");
        if let Err(err) = self.refresh().await {
            if err.is_session_expired() {
                return Err(err);
            }
            warn!(error = %err, "re-fetch after planting failed, appending locally");
            let mut habits: Vec<Habit> = self.habits().cloned().collect();
            habits.push(habit.clone());
            self.slots = layout(habits);
        }
        Ok(habit)
    }

    pub async fn edit(
        &mut self,
        index: usize,
        name: &str,
        frequency: Frequency,
    ) -> Result<Habit, HabitError> {
        let id = self.occupied_id(index)?;
        let name = validate_habit_name(name)?;
        let habit = self.store.update_habit(&id, &name, frequency).await?;
        info!(slot = index, habit_id = %habit.id, "habit updated");
        self.slots[index] = GridSlot::Occupied(habit.clone());
        Ok(habit)
    }

    pub async fn remove(&mut self, index: usize) -> Result<(), HabitError> {
        let id = self.occupied_id(index)?;
        self.store.delete_habit(&id).await?;
        info!(slot = index, habit_id = %id, "habit dug up");
        if let Err(err) = self.refresh().await {
            if err.is_session_expired() {
                return Err(err);
            }
            warn!(error = %err, "re-fetch after digging up failed, compacting locally");
            let habits: Vec<Habit> = self
                .habits()
                .filter(|habit| habit.id != id)
                .cloned()
                .collect();
            self.slots = layout(habits);
        }
        Ok(())
    }

    pub async fn track_completion(&mut self, index: usize) -> Result<Habit, HabitError> {
        let id = self.occupied_id(index)?;
        let outcome = self.store.complete_habit(&id).await?;
        info!(
            slot = index,
            habit_id = %id,
            already_completed = outcome.already_completed,
            revived = outcome.revived,
            "habit watered"
        );
        self.slots[index] = GridSlot::Occupied(outcome.habit.clone());
        Ok(outcome.habit)
    }

    /// Deletes every planted habit in slot order, stopping at the first
    /// failure, then re-syncs with the backend.
    pub async fn clear(&mut self) -> Result<(), HabitError> {
        let ids: Vec<String> = self.habits().map(|habit| habit.id.clone()).collect();
        for id in ids {
            if let Err(err) = self.store.delete_habit(&id).await {
                warn!(habit_id = %id, error = %err, "clearing garden stopped");
                if !err.is_session_expired() {
                    if let Err(refresh_err) = self.refresh().await {
                        warn!(error = %refresh_err, "refresh after failed clear");
                    }
                }
                return Err(err);
            }
        }
        self.refresh().await?;
        Ok(())
    }

    pub async fn history(
        &self,
        index: usize,
        days: u32,
    ) -> Result<CompletionHistory, HabitError> {
        let id = self.occupied_id(index)?;
        self.store.completion_history(&id, days).await
    }

    fn occupied_id(&self, index: usize) -> Result<String, HabitError> {
        self.slots
            .get(index)
            .and_then(GridSlot::habit)
            .map(|habit| habit.id.clone())
            .ok_or(HabitError::NotFound { slot: index })
    }
}
