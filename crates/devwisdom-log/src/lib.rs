pub mod clock;
pub mod record;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use parking_lot::Mutex;
use thiserror::Error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use record::{ConsultationRecord, ADVISOR_CONSULTATION};

pub const DEFAULT_LOG_DIR: &str = ".devwisdom";
pub const CURRENT_FILE: &str = "consultations.jsonl";
/// Upper bound on a read window, about a century.
pub const MAX_READ_DAYS: u32 = 36_500;

const ROTATED_PREFIX: &str = "consultations-";
const ROTATED_SUFFIX: &str = ".jsonl";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug)]
struct State {
    file: Option<File>,
    date: NaiveDate,
}

/// Append-only JSONL log of consultations, rotated once per calendar day.
///
/// `consultations.jsonl` is the live file. When the date changes it is
/// renamed to `consultations-YYYY-MM-DD.jsonl` for the day it was opened
/// and a fresh live file takes its place. Every operation holds one lock
/// for its whole duration, so appends from several threads never
/// interleave and reads never see a half-rotated directory.
#[derive(Debug)]
pub struct ConsultationLog {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl ConsultationLog {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LogError> {
        Self::open_with_clock(dir, Arc::new(SystemClock))
    }

    pub fn open_with_clock(dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, LogError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| LogError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let today = clock.today();
        if let Some(modified) = modified_date(&dir.join(CURRENT_FILE)) {
            if modified != today {
                rotate_file(&dir, modified);
            }
        }
        let file = open_current(&dir)?;

        tracing::debug!(dir = %dir.display(), %today, "consultation log opened");
        Ok(Self {
            dir,
            clock,
            state: Mutex::new(State {
                file: Some(file),
                date: today,
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_FILE)
    }

    pub fn append(&self, record: &ConsultationRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut state = self.state.lock();
        self.rotate_locked(&mut state)?;
        let file = writer(&mut state, &self.dir)?;
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(())
    }

    /// Rotates when the clock has moved past the log's date. Returns whether
    /// the live file was renamed.
    pub fn rotate_if_needed(&self) -> Result<bool, LogError> {
        let mut state = self.state.lock();
        self.rotate_locked(&mut state)
    }

    fn rotate_locked(&self, state: &mut State) -> Result<bool, LogError> {
        let today = self.clock.today();
        if state.date == today {
            return Ok(false);
        }
        state.file = None;
        let renamed = rotate_file(&self.dir, state.date);
        state.file = Some(open_current(&self.dir)?);
        state.date = today;
        Ok(renamed)
    }

    /// Records from the last `days` days: the live file first, then rotated
    /// files in name order. Lines that do not decode are skipped.
    pub fn read(&self, days: u32) -> Result<Vec<ConsultationRecord>, LogError> {
        let _state = self.state.lock();
        let now = self.clock.now();
        let window = TimeDelta::try_days(i64::from(days.min(MAX_READ_DAYS)))
            .unwrap_or_else(TimeDelta::zero);
        let cutoff = now.checked_sub_signed(window).unwrap_or(now);
        let cutoff_utc = cutoff.with_timezone(&Utc);
        let cutoff_date = cutoff.date_naive();

        let mut records = Vec::new();
        match fs::read(self.current_path()) {
            Ok(bytes) => collect_records(&bytes, cutoff_utc, &mut records),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        for (date, path) in self.rotated_files()? {
            if date < cutoff_date {
                continue;
            }
            match fs::read(&path) {
                Ok(bytes) => collect_records(&bytes, cutoff_utc, &mut records),
                Err(err) => {
                    tracing::warn!(path = %path.display(), "skipping unreadable log file: {err}");
                }
            }
        }
        Ok(records)
    }

    /// Closes the live handle. A later append opens it again.
    pub fn close(&self) {
        self.state.lock().file = None;
    }

    fn rotated_files(&self) -> Result<Vec<(NaiveDate, PathBuf)>, LogError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(date) = name.to_str().and_then(rotated_date) else {
                continue;
            };
            files.push((date, entry.path()));
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }
}

pub fn rotated_file_name(date: NaiveDate) -> String {
    format!("{ROTATED_PREFIX}{}{ROTATED_SUFFIX}", date.format("%Y-%m-%d"))
}

fn rotated_date(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(ROTATED_PREFIX)?.strip_suffix(ROTATED_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

fn open_current(dir: &Path) -> Result<File, LogError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(CURRENT_FILE))?;
    Ok(file)
}

fn writer<'a>(state: &'a mut State, dir: &Path) -> Result<&'a mut File, LogError> {
    let file = match state.file.take() {
        Some(file) => file,
        None => open_current(dir)?,
    };
    Ok(state.file.insert(file))
}

fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

/// Renames the live file to its dated name. Never replaces an existing
/// rotated file; a missing live file is not an error.
fn rotate_file(dir: &Path, date: NaiveDate) -> bool {
    let current = dir.join(CURRENT_FILE);
    let target = dir.join(rotated_file_name(date));
    if target.exists() {
        tracing::warn!(target = %target.display(), "rotated log already exists, keeping live file");
        return false;
    }
    match fs::rename(&current, &target) {
        Ok(()) => {
            tracing::info!(target = %target.display(), "rotated consultation log");
            true
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            tracing::warn!(target = %target.display(), "log rotation failed: {err}");
            false
        }
    }
}

fn collect_records(bytes: &[u8], cutoff: DateTime<Utc>, out: &mut Vec<ConsultationRecord>) {
    for line in bytes.split(|b| *b == b'\n') {
        if line.trim_ascii().is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_slice::<ConsultationRecord>(line) else {
            continue;
        };
        let Some(timestamp) = record.parsed_timestamp() else {
            continue;
        };
        if timestamp.with_timezone(&Utc) >= cutoff {
            out.push(record);
        }
    }
}
