use serde::Serialize;

use nighthawk_stats::StatRecord;

/// A named counter value, as it appears in the result document's
/// `counters[]` array.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CounterEntry {
    pub name: String,
    pub value: u64,
}

/// The merged, global view of one run: every worker's statistics `combine`d
/// by id, every worker's counters summed by name. This is the single
/// `results[]` entry named `"global"`; the CLI binary layer wraps it with
/// the echoed options and timestamp before it reaches a formatter.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct GlobalResult {
    pub statistics: Vec<StatRecord>,
    pub counters: Vec<CounterEntry>,
}
