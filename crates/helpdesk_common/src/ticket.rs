//! Ticket records and their on-disk form.
//!
//! One interaction becomes one JSON file named `ticket_<YYYYMMDD_HHMMSS>.json`.
//! Files are created, never rewritten. When two tickets land in the same
//! second the later one gets a `_1`, `_2`, ... suffix instead of replacing
//! the earlier file.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classifier::{Department, Severity};
use crate::context::SystemContext;
use crate::error::HelpdeskError;

/// Filename prefix of every ticket
pub const TICKET_PREFIX: &str = "ticket_";

/// Filename extension of every ticket
pub const TICKET_EXTENSION: &str = "json";

/// Timestamp format used in ticket filenames
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Give up after this many same-second collisions
const MAX_SUFFIX: u32 = 1000;

/// Everything recorded about one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    #[serde(flatten)]
    pub context: SystemContext,
    pub user_input: String,
    pub ai_response: String,
    pub severity: Severity,
    pub department: Department,
}

impl TicketRecord {
    pub fn new(
        context: SystemContext,
        user_input: impl Into<String>,
        ai_response: impl Into<String>,
        severity: Severity,
        department: Department,
    ) -> Self {
        Self {
            context,
            user_input: user_input.into(),
            ai_response: ai_response.into(),
            severity,
            department,
        }
    }
}

/// Filename for a ticket written at `now`, with an optional collision suffix
pub fn ticket_filename(now: &DateTime<Local>, suffix: u32) -> String {
    let stamp = now.format(FILENAME_TIMESTAMP_FORMAT);
    if suffix == 0 {
        format!("{}{}.{}", TICKET_PREFIX, stamp, TICKET_EXTENSION)
    } else {
        format!("{}{}_{}.{}", TICKET_PREFIX, stamp, suffix, TICKET_EXTENSION)
    }
}

/// Save a ticket into `dir`, creating the directory if needed.
/// Returns the path of the new file.
pub fn save(record: &TicketRecord, dir: &Path) -> Result<PathBuf, HelpdeskError> {
    save_at(record, dir, Local::now())
}

/// Save a ticket using `now` for the filename
pub fn save_at(
    record: &TicketRecord,
    dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf, HelpdeskError> {
    fs::create_dir_all(dir)?;

    let (path, file) = create_unique(dir, &now)?;
    if let Err(e) = write_record(file, record) {
        // Do not leave a half-written ticket behind
        let _ = fs::remove_file(&path);
        return Err(e);
    }

    info!("ticket saved to {}", path.display());
    Ok(path)
}

fn create_unique(dir: &Path, now: &DateTime<Local>) -> Result<(PathBuf, File), HelpdeskError> {
    for suffix in 0..MAX_SUFFIX {
        let path = dir.join(ticket_filename(now, suffix));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next suffix", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(HelpdeskError::TicketDir(format!(
        "{} tickets already exist for {} in {}",
        MAX_SUFFIX,
        now.format(FILENAME_TIMESTAMP_FORMAT),
        dir.display()
    )))
}

fn write_record(file: File, record: &TicketRecord) -> Result<(), HelpdeskError> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Read a ticket back from disk
pub fn load_ticket(path: &Path) -> Result<TicketRecord, HelpdeskError> {
    let content = fs::read_to_string(path)?;
    let record = serde_json::from_str(&content)?;
    Ok(record)
}
