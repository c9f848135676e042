use crate::grid::{GridSlot, is_pending};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GardenSummary {
    pub occupied: usize,
    pub empty: usize,
    pub pending: usize,
    pub done: usize,
    pub wilting: usize,
}

pub fn summarize(slots: &[GridSlot]) -> GardenSummary {
    let mut summary = GardenSummary::default();
    for slot in slots {
        let Some(habit) = slot.habit() else {
            summary.empty += 1;
            continue;
        };
        summary.occupied += 1;
        if is_pending(slot) {
            summary.pending += 1;
        } else {
            summary.done += 1;
        }
        if habit.is_wilting() {
            summary.wilting += 1;
        }
    }
    summary
}

/// Names the wilting plants, if any, so the garden can nag about them.
pub fn wilting_reminder(slots: &[GridSlot]) -> Option<String> {
    let names: Vec<&str> = slots
        .iter()
        .filter_map(GridSlot::habit)
        .filter(|habit| habit.is_wilting())
        .map(|habit| habit.name.as_str())
        .collect();
    match names.as_slice() {
        [] => None,
        [one] => Some(format!("{one} is wilting. Track it today to save your plant!")),
        many => Some(format!(
            "{} are wilting. Track them today to save your plants!",
            many.join(", ")
        )),
    }
}
