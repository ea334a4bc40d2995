#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use memtrail::system::provider::{CapabilityProvider, MemoryCounters, ProcessEntry, SampleError};
use memtrail::system::reading::Reading;

pub const MB: u64 = 1024 * 1024;

pub fn process(pid: u32, name: &str, working_set: u64, handles: u64) -> ProcessEntry {
    ProcessEntry {
        pid,
        name: name.to_string(),
        working_set: Reading::Available(working_set),
        handle_count: Reading::Available(handles),
    }
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .expect("valid test timestamp")
}

/// In-memory host. `fail_enumeration` is shared so a test can flip it
/// while the provider is owned by a logger.
pub struct FakeProvider {
    pub total: Reading,
    pub counters: MemoryCounters,
    pub processes: Vec<ProcessEntry>,
    pub fail_enumeration: Rc<Cell<bool>>,
    pub counter_reads: Rc<Cell<usize>>,
    pub total_reads: Rc<Cell<usize>>,
}

impl FakeProvider {
    pub fn new(total: u64, available: u64, processes: Vec<ProcessEntry>) -> Self {
        FakeProvider {
            total: Reading::Available(total),
            counters: MemoryCounters {
                available: Reading::Available(available),
                non_paged_pool: Reading::Available(0),
                paged_pool: Reading::Available(0),
            },
            processes,
            fail_enumeration: Rc::new(Cell::new(false)),
            counter_reads: Rc::new(Cell::new(0)),
            total_reads: Rc::new(Cell::new(0)),
        }
    }

    /// The two-process table used throughout the scenarios.
    pub fn two_processes() -> Self {
        FakeProvider::new(
            1000 * MB,
            400 * MB,
            vec![process(1, "A", 500 * MB, 200), process(2, "B", 300 * MB, 50)],
        )
    }
}

impl CapabilityProvider for FakeProvider {
    fn total_memory(&mut self) -> Reading {
        self.total_reads.set(self.total_reads.get() + 1);
        self.total
    }

    fn memory_counters(&mut self) -> MemoryCounters {
        self.counter_reads.set(self.counter_reads.get() + 1);
        self.counters
    }

    fn processes(&mut self) -> Result<Vec<ProcessEntry>, SampleError> {
        if self.fail_enumeration.get() {
            return Err(SampleError::ProcessTableUnavailable);
        }
        Ok(self.processes.clone())
    }
}

/// A clock that walks through `times`, repeating the last one.
pub fn stepping_clock(times: Vec<NaiveDateTime>) -> impl Fn() -> NaiveDateTime {
    let index = Cell::new(0usize);
    move || {
        let i = index.get();
        index.set(i + 1);
        times[i.min(times.len() - 1)]
    }
}
