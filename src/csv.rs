//! The daily log's row schema.
//!
//! Fields are joined with bare commas. Process names are written as-is with
//! no quoting, so the file stays byte-compatible with existing logs and their
//! readers.

use std::fmt::Write;

use crate::system::sampler::{TOP_HANDLE_COUNT, TOP_WORKING_SET};
use crate::system::snapshot::{RankedProcess, ResourceSnapshot};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

const FIXED_COLUMNS: [&str; 7] = [
    "Timestamp",
    "TotalMB",
    "AvailableMB",
    "UsedMB",
    "Usage%",
    "NonPagedPoolMB",
    "PagedPoolMB",
];

/// Number of fields in every header and data row.
pub const COLUMN_COUNT: usize = FIXED_COLUMNS.len() + 2 * (TOP_WORKING_SET + TOP_HANDLE_COUNT);

/// Used memory and its share of the total, derived at format time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryUsage {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    /// `None` when the installed total could not be detected.
    pub usage_percent: Option<f64>,
}

impl MemoryUsage {
    pub fn from_snapshot(snapshot: &ResourceSnapshot) -> Self {
        let total_bytes = snapshot.total_memory.or_zero();
        let available_bytes = snapshot.available_memory.or_zero();
        let used_bytes = total_bytes.saturating_sub(available_bytes);
        let usage_percent = if total_bytes == 0 {
            None
        } else {
            Some(used_bytes as f64 / total_bytes as f64 * 100.0)
        };
        MemoryUsage {
            total_bytes,
            available_bytes,
            used_bytes,
            usage_percent,
        }
    }
}

pub fn header() -> String {
    let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    for rank in 1..=TOP_WORKING_SET {
        columns.push(format!("TopMem{rank}_Name"));
        columns.push(format!("TopMem{rank}_MB"));
    }
    for rank in 1..=TOP_HANDLE_COUNT {
        columns.push(format!("TopHandle{rank}_Name"));
        columns.push(format!("TopHandle{rank}_Count"));
    }
    columns.join(",")
}

/// Formats one data row, without the line terminator.
pub fn format_row(snapshot: &ResourceSnapshot) -> String {
    let usage = MemoryUsage::from_snapshot(snapshot);
    let mut row = String::with_capacity(512);

    let _ = write!(
        row,
        "{},{},{},{},{},{},{}",
        snapshot.timestamp.format(TIMESTAMP_FORMAT),
        whole_mb(usage.total_bytes),
        whole_mb(usage.available_bytes),
        whole_mb(usage.used_bytes),
        usage
            .usage_percent
            .map(|p| format!("{p:.2}"))
            .unwrap_or_default(),
        decimal_mb(snapshot.non_paged_pool.or_zero()),
        decimal_mb(snapshot.paged_pool.or_zero()),
    );

    push_rank_slots(
        &mut row,
        &snapshot.top_by_working_set,
        TOP_WORKING_SET,
        decimal_mb,
    );
    push_rank_slots(
        &mut row,
        &snapshot.top_by_handle_count,
        TOP_HANDLE_COUNT,
        |count| count.to_string(),
    );

    row
}

/// Appends exactly `slots` name/value pairs; ranks with no process are empty.
fn push_rank_slots<F>(row: &mut String, ranked: &[RankedProcess], slots: usize, value: F)
where
    F: Fn(u64) -> String,
{
    for slot in 0..slots {
        match ranked.get(slot) {
            Some(process) => {
                let _ = write!(row, ",{},{}", process.name, value(process.value));
            }
            None => row.push_str(",,"),
        }
    }
}

pub fn whole_mb(bytes: u64) -> String {
    format!("{:.0}", bytes as f64 / BYTES_PER_MB)
}

pub fn decimal_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MB)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::system::reading::Reading;

    const MB: u64 = 1024 * 1024;

    fn snapshot() -> ResourceSnapshot {
        ResourceSnapshot {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 9)
                .and_then(|d| d.and_hms_opt(7, 5, 0))
                .unwrap(),
            total_memory: Reading::Available(1000 * MB),
            available_memory: Reading::Available(400 * MB),
            non_paged_pool: Reading::Available(3 * MB / 2),
            paged_pool: Reading::Unavailable,
            top_by_working_set: vec![
                RankedProcess {
                    name: "A".into(),
                    value: 500 * MB,
                },
                RankedProcess {
                    name: "B".into(),
                    value: 300 * MB,
                },
            ],
            top_by_handle_count: vec![
                RankedProcess {
                    name: "A".into(),
                    value: 200,
                },
                RankedProcess {
                    name: "B".into(),
                    value: 50,
                },
            ],
        }
    }

    #[test]
    fn header_has_every_rank_slot() {
        insta::assert_snapshot!(header(), @"Timestamp,TotalMB,AvailableMB,UsedMB,Usage%,NonPagedPoolMB,PagedPoolMB,TopMem1_Name,TopMem1_MB,TopMem2_Name,TopMem2_MB,TopMem3_Name,TopMem3_MB,TopMem4_Name,TopMem4_MB,TopMem5_Name,TopMem5_MB,TopMem6_Name,TopMem6_MB,TopMem7_Name,TopMem7_MB,TopMem8_Name,TopMem8_MB,TopMem9_Name,TopMem9_MB,TopMem10_Name,TopMem10_MB,TopHandle1_Name,TopHandle1_Count,TopHandle2_Name,TopHandle2_Count,TopHandle3_Name,TopHandle3_Count,TopHandle4_Name,TopHandle4_Count,TopHandle5_Name,TopHandle5_Count");
        assert_eq!(header().split(',').count(), COLUMN_COUNT);
    }

    #[test]
    fn row_matches_header_width() {
        assert_eq!(format_row(&snapshot()).split(',').count(), COLUMN_COUNT);

        let mut empty = snapshot();
        empty.top_by_working_set.clear();
        empty.top_by_handle_count.clear();
        assert_eq!(format_row(&empty).split(',').count(), COLUMN_COUNT);
    }

    #[test]
    fn row_fields() {
        let row = format_row(&snapshot());
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(
            &fields[..7],
            ["2024-03-09 07:05:00", "1000", "400", "600", "60.00", "1.50", "0.00"]
        );
        assert_eq!(&fields[7..11], ["A", "500.00", "B", "300.00"]);
        assert!(fields[11..27].iter().all(|f| f.is_empty()));
        assert_eq!(&fields[27..31], ["A", "200", "B", "50"]);
        assert!(fields[31..].iter().all(|f| f.is_empty()));
    }

    #[test]
    fn usage_is_blank_without_total() {
        let mut snap = snapshot();
        snap.total_memory = Reading::Unavailable;
        let usage = MemoryUsage::from_snapshot(&snap);
        assert_eq!(usage.usage_percent, None);
        assert_eq!(usage.used_bytes, 0);

        let row = format_row(&snap);
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields[1], "0");
        assert_eq!(fields[4], "");
    }

    #[test]
    fn usage_percent_matches_definition() {
        let mut snap = snapshot();
        snap.total_memory = Reading::Available(3 * MB);
        snap.available_memory = Reading::Available(2 * MB);
        let usage = MemoryUsage::from_snapshot(&snap);
        let percent = usage.usage_percent.unwrap();
        assert!((percent - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(format_row(&snap).split(',').nth(4), Some("33.33"));
    }

    #[test]
    fn commas_in_names_are_not_escaped() {
        let mut snap = snapshot();
        snap.top_by_working_set[0].name = "odd,name".into();
        assert!(format_row(&snap).contains(",odd,name,500.00,"));
    }
}
