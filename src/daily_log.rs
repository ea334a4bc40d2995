//! One append-only CSV file per local calendar day.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::csv;

pub const FILE_SUFFIX: &str = "_log.csv";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to append to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Appended {
    pub path: PathBuf,
    pub wrote_header: bool,
}

#[derive(Clone, Debug)]
pub struct DailyLog {
    dir: PathBuf,
}

impl DailyLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DailyLog { dir: dir.into() }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{FILE_SUFFIX}", date.format("%Y-%m-%d")))
    }

    /// Appends `row` to the file for `date`, opening and closing it within
    /// the call. A missing or empty file gets the header first; header and
    /// row go out in a single write.
    pub fn append(&self, date: NaiveDate, row: &str) -> Result<Appended, LogError> {
        fs::create_dir_all(&self.dir).map_err(|source| LogError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(date);
        let existing_len = match fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(source) => return Err(LogError::Open { path, source }),
        };
        let wrote_header = existing_len == 0;

        let mut buf = String::with_capacity(row.len() + 1024);
        if wrote_header {
            buf.push_str(&csv::header());
            buf.push('\n');
        } else if !ends_with_newline(&path) {
            // A previous run was killed mid-line; start a fresh one
            buf.push('\n');
        }
        buf.push_str(row);
        buf.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;
        file.write_all(buf.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| LogError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(Appended { path, wrote_header })
    }
}

fn ends_with_newline(path: &Path) -> bool {
    let last_byte = || -> io::Result<u8> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::End(-1))?;
        let mut byte = [0u8; 1];
        file.read_exact(&mut byte)?;
        Ok(byte[0])
    };
    // If the tail can't be read, assume the file is intact
    last_byte().map(|b| b == b'\n').unwrap_or(true)
}
