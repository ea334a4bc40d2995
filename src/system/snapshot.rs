use chrono::NaiveDateTime;

use super::reading::Reading;

/// A process's position in one of the per-cycle rankings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedProcess {
    pub name: String,
    pub value: u64,
}

/// Everything sampled in one cycle. Built fresh, formatted, then dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceSnapshot {
    /// Local wall-clock time the sample was taken.
    pub timestamp: NaiveDateTime,
    pub total_memory: Reading,
    pub available_memory: Reading,
    pub non_paged_pool: Reading,
    pub paged_pool: Reading,
    /// Working-set bytes, descending, at most ten entries.
    pub top_by_working_set: Vec<RankedProcess>,
    /// Open handle/descriptor counts, descending, at most five entries.
    pub top_by_handle_count: Vec<RankedProcess>,
}
