//! Offline summary of the daily logs in a directory: totals, kernel pool
//! trend, and the processes that peaked highest over the whole period.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, warn};

use crate::csv::TIMESTAMP_FORMAT;
use crate::daily_log::FILE_SUFFIX;
use crate::system::sampler::{TOP_HANDLE_COUNT, TOP_WORKING_SET};

pub const MEMORY_CONSUMERS: usize = 5;
pub const HANDLE_CONSUMERS: usize = 3;

/// Logs written before kernel pools were tracked lack this column.
const REQUIRED_COLUMN: &str = "NonPagedPoolMB";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to list {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no usable *_log.csv files in {}", .dir.display())]
    NoLogs { dir: PathBuf },
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogRow {
    pub timestamp: NaiveDateTime,
    pub used_mb: f64,
    pub usage_percent: Option<f64>,
    pub non_paged_pool_mb: f64,
    pub paged_pool_mb: f64,
    pub top_memory: Vec<(String, f64)>,
    pub top_handles: Vec<(String, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trend {
    pub first: f64,
    pub last: f64,
    pub peak: f64,
}

impl Trend {
    fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
        let mut trend: Option<Trend> = None;
        for value in values {
            trend = Some(match trend {
                None => Trend {
                    first: value,
                    last: value,
                    peak: value,
                },
                Some(t) => Trend {
                    first: t.first,
                    last: value,
                    peak: t.peak.max(value),
                },
            });
        }
        trend
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Consumer {
    pub name: String,
    pub peak: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub files: usize,
    pub samples: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub peak_used_mb: f64,
    pub peak_usage_percent: Option<f64>,
    pub non_paged_pool: Trend,
    pub paged_pool: Trend,
    pub memory_consumers: Vec<Consumer>,
    pub handle_consumers: Vec<Consumer>,
}

/// Reads every daily log in `dir` and summarises them.
pub fn build_report(dir: &Path) -> Result<Report, ReportError> {
    let entries = fs::read_dir(dir).map_err(|source| ReportError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(FILE_SUFFIX))
        })
        .collect();
    paths.sort();

    let mut files = 0;
    let mut rows = Vec::new();
    for path in &paths {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                continue;
            }
        };
        match parse_log(&contents) {
            Some(parsed) => {
                files += 1;
                rows.extend(parsed);
            }
            None => warn!(
                "skipping {}: old format (missing {REQUIRED_COLUMN})",
                path.display()
            ),
        }
    }

    summarize(files, rows).ok_or_else(|| ReportError::NoLogs {
        dir: dir.to_path_buf(),
    })
}

/// Parses one log file. `None` when the header predates kernel pool columns.
/// Rows whose width disagrees with the header (a comma inside a process
/// name) or whose timestamp does not parse are dropped.
pub fn parse_log(contents: &str) -> Option<Vec<LogRow>> {
    let mut lines = contents.lines();
    let header: Vec<&str> = lines.next()?.split(',').collect();
    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, column)| (*column, i))
        .collect();
    if !columns.contains_key(REQUIRED_COLUMN) {
        return None;
    }
    let rank_value_columns: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            (c.starts_with("TopMem") && c.ends_with("_MB"))
                || (c.starts_with("TopHandle") && c.ends_with("_Count"))
        })
        .map(|(i, _)| i)
        .collect();

    let mut rows = Vec::new();
    for line in lines.filter(|l| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split(',').collect();
        let trailing_comma = fields.len() == header.len() + 1 && fields.last() == Some(&"");
        if fields.len() != header.len() && !trailing_comma {
            debug!("dropping misaligned row: {line}");
            continue;
        }
        // A single comma in a name can still look like a trailing comma;
        // the shift then lands a name fragment in a value column.
        let rank_values_numeric = rank_value_columns.iter().all(|&i| {
            let value = fields[i].trim();
            value.is_empty() || value.parse::<f64>().is_ok()
        });
        if !rank_values_numeric {
            debug!("dropping shifted row: {line}");
            continue;
        }
        let field = |name: &str| columns.get(name).and_then(|&i| fields.get(i)).copied();
        let number = |name: &str| field(name).and_then(|v| v.trim().parse::<f64>().ok());

        let Some(timestamp) = field("Timestamp")
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).ok())
        else {
            debug!("dropping row with unparsable timestamp: {line}");
            continue;
        };

        let ranked = |prefix: &str, value_suffix: &str, slots: usize| {
            (1..=slots)
                .filter_map(|rank| {
                    let name = field(&format!("{prefix}{rank}_Name"))?;
                    let value = number(&format!("{prefix}{rank}_{value_suffix}"))?;
                    (!name.is_empty()).then(|| (name.to_string(), value))
                })
                .collect::<Vec<_>>()
        };

        rows.push(LogRow {
            timestamp,
            used_mb: number("UsedMB").unwrap_or(0.0),
            usage_percent: number("Usage%"),
            non_paged_pool_mb: number("NonPagedPoolMB").unwrap_or(0.0),
            paged_pool_mb: number("PagedPoolMB").unwrap_or(0.0),
            top_memory: ranked("TopMem", "MB", TOP_WORKING_SET),
            top_handles: ranked("TopHandle", "Count", TOP_HANDLE_COUNT),
        });
    }
    Some(rows)
}

fn summarize(files: usize, mut rows: Vec<LogRow>) -> Option<Report> {
    if rows.is_empty() {
        return None;
    }
    rows.sort_by_key(|r| r.timestamp);

    let first = rows.first()?.timestamp;
    let last = rows.last()?.timestamp;

    Some(Report {
        files,
        samples: rows.len(),
        first,
        last,
        peak_used_mb: rows.iter().map(|r| r.used_mb).fold(0.0, f64::max),
        peak_usage_percent: rows
            .iter()
            .filter_map(|r| r.usage_percent)
            .reduce(f64::max),
        non_paged_pool: Trend::over(rows.iter().map(|r| r.non_paged_pool_mb))?,
        paged_pool: Trend::over(rows.iter().map(|r| r.paged_pool_mb))?,
        memory_consumers: top_consumers(
            rows.iter().map(|r| &r.top_memory),
            MEMORY_CONSUMERS,
        ),
        handle_consumers: top_consumers(
            rows.iter().map(|r| &r.top_handles),
            HANDLE_CONSUMERS,
        ),
    })
}

/// Ranks process names by their highest per-sample value. A name that fills
/// several rank slots in one sample counts as the sum of those slots.
fn top_consumers<'a>(
    samples: impl Iterator<Item = &'a Vec<(String, f64)>>,
    limit: usize,
) -> Vec<Consumer> {
    let mut peaks: HashMap<&str, f64> = HashMap::new();
    for sample in samples {
        let mut per_name: HashMap<&str, f64> = HashMap::new();
        for (name, value) in sample {
            *per_name.entry(name.as_str()).or_insert(0.0) += value;
        }
        for (name, total) in per_name {
            let peak = peaks.entry(name).or_insert(total);
            *peak = peak.max(total);
        }
    }

    let mut consumers: Vec<Consumer> = peaks
        .into_iter()
        .map(|(name, peak)| Consumer {
            name: name.to_string(),
            peak,
        })
        .collect();
    consumers.sort_by(|a, b| b.peak.total_cmp(&a.peak).then_with(|| a.name.cmp(&b.name)));
    consumers.truncate(limit);
    consumers
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} samples from {} file(s), {} to {}",
            self.samples,
            self.files,
            self.first.format(TIMESTAMP_FORMAT),
            self.last.format(TIMESTAMP_FORMAT)
        )?;
        write!(f, "Peak used memory: {:.0} MB", self.peak_used_mb)?;
        if let Some(percent) = self.peak_usage_percent {
            write!(f, " ({percent:.2}%)")?;
        }
        writeln!(f)?;
        for (label, trend) in [
            ("Non-paged pool", self.non_paged_pool),
            ("Paged pool", self.paged_pool),
        ] {
            writeln!(
                f,
                "{label}: first {:.2} MB, last {:.2} MB, peak {:.2} MB",
                trend.first, trend.last, trend.peak
            )?;
        }
        writeln!(f, "Top memory consumers (peak MB):")?;
        for consumer in &self.memory_consumers {
            writeln!(f, "  {:<32} {:>10.2}", consumer.name, consumer.peak)?;
        }
        writeln!(f, "Top handle consumers (peak count):")?;
        for consumer in &self.handle_consumers {
            writeln!(f, "  {:<32} {:>10.0}", consumer.name, consumer.peak)?;
        }
        Ok(())
    }
}
