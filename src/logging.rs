// src/logging.rs
//! Rotating activity log. Every line in the file carries a
//! `[dd/mm/yyyy HH:MM:SS]` prefix; the file is renamed away once it is
//! older than 24 hours. Exposed as a `MakeWriter` so a fmt layer feeds it
//! the same events the console sees.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Throttle for filesystem age queries.
const ROTATION_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const MAX_FILE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

struct LogFile {
    path: PathBuf,
    file: File,
    created_at: SystemTime,
    /// `None` forces a rotation check on the next write.
    last_check: Option<Instant>,
    /// Whether the next chunk starts a fresh output line (and so gets a
    /// timestamp prefix). Continuations of an unterminated line do not.
    new_line: bool,
}

impl LogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let created_at = file
            .metadata()
            .and_then(|m| m.created().or_else(|_| m.modified()))
            .unwrap_or_else(|_| SystemTime::now());
        Ok(Self {
            path,
            file,
            created_at,
            last_check: Some(Instant::now()),
            new_line: true,
        })
    }

    fn rotated_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app");
        let stamp = DateTime::<Local>::from(self.created_at).format("%Y-%m-%d_%H-%M-%S");
        self.path.with_file_name(format!("{stem}_{stamp}.log"))
    }

    fn rotate_if_needed(&mut self) {
        if let Some(last) = self.last_check {
            if last.elapsed() < ROTATION_CHECK_INTERVAL {
                return;
            }
        }
        self.last_check = Some(Instant::now());

        let age = SystemTime::now()
            .duration_since(self.created_at)
            .unwrap_or_default();
        if age <= MAX_FILE_AGE {
            return;
        }

        let _ = self.file.flush();
        let rotated = self.rotated_path();
        if !rotated.exists() {
            if let Err(e) = fs::rename(&self.path, &rotated) {
                eprintln!("activity log rotation failed: {e}");
                return;
            }
        }

        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => {
                self.file = file;
                self.created_at = SystemTime::now();
                self.new_line = true;
                self.write_str(&format!(
                    ">>> log rotated, previous file: {}\n",
                    rotated.display()
                ));
            }
            Err(e) => eprintln!("could not reopen activity log: {e}"),
        }
    }

    fn write_str(&mut self, msg: &str) {
        self.rotate_if_needed();
        if msg.is_empty() {
            return;
        }

        // One timestamp per incoming chunk, applied to each line it starts.
        let prefix = Local::now().format("[%d/%m/%Y %H:%M:%S] ").to_string();

        for line in msg.split_inclusive('\n') {
            if self.new_line && line != "\n" {
                let _ = self.file.write_all(prefix.as_bytes());
            }
            let _ = self.file.write_all(line.as_bytes());
            self.new_line = line.ends_with('\n');
        }
        let _ = self.file.flush();
    }
}

/// Cloneable handle to the process-wide activity log.
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<Mutex<LogFile>>,
}

impl ActivityLog {
    pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(LogFile::open(path.as_ref().to_path_buf())?)),
        })
    }

    #[cfg(test)]
    fn pretend_created_ago(&self, age: Duration) {
        let mut guard = self.inner.lock().expect("activity log mutex poisoned");
        guard.created_at = SystemTime::now() - age;
        guard.last_check = None;
    }
}

pub struct ActivityLogWriter {
    inner: Arc<Mutex<LogFile>>,
}

impl io::Write for ActivityLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        self.inner
            .lock()
            .expect("activity log mutex poisoned")
            .write_str(&msg);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .expect("activity log mutex poisoned")
            .file
            .flush()
    }
}

impl<'a> MakeWriter<'a> for ActivityLog {
    type Writer = ActivityLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ActivityLogWriter {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Install the subscriber: compact console output plus the rotating file,
/// both behind `RUST_LOG` (default `info`).
pub fn init(activity_log: &ActivityLog) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(
            fmt::layer()
                .compact()
                .with_ansi(false)
                // The activity log stamps its own timestamps.
                .without_time()
                .with_writer(activity_log.clone()),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn write_chunk(log: &ActivityLog, chunk: &str) {
        log.make_writer().write_all(chunk.as_bytes()).unwrap();
    }

    fn assert_prefixed(line: &str) -> &str {
        assert_eq!(line.as_bytes().first(), Some(&b'['), "line: {line:?}");
        let stamp = &line[1..20];
        NaiveDateTime::parse_from_str(stamp, "%d/%m/%Y %H:%M:%S")
            .unwrap_or_else(|e| panic!("bad timestamp {stamp:?}: {e}"));
        assert_eq!(&line[20..22], "] ");
        &line[22..]
    }

    #[test]
    fn lines_are_timestamp_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let log = ActivityLog::open(&path).unwrap();

        write_chunk(&log, "first line\nsecond line\n");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(assert_prefixed(lines[0]), "first line");
        assert_eq!(assert_prefixed(lines[1]), "second line");
    }

    #[test]
    fn continuation_of_an_open_line_is_not_reprefixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let log = ActivityLog::open(&path).unwrap();

        write_chunk(&log, "progress: ");
        write_chunk(&log, "done\n");
        write_chunk(&log, "next\n");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(assert_prefixed(lines[0]), "progress: done");
        assert_eq!(assert_prefixed(lines[1]), "next");
    }

    #[test]
    fn bare_newlines_are_not_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let log = ActivityLog::open(&path).unwrap();

        write_chunk(&log, "a\n\nb\n");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(assert_prefixed(lines[0]), "a");
        assert_eq!(lines[1], "");
        assert_eq!(assert_prefixed(lines[2]), "b");
    }

    #[test]
    fn stale_file_is_rotated_with_a_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let log = ActivityLog::open(&path).unwrap();

        write_chunk(&log, "old entry\n");
        log.pretend_created_ago(Duration::from_secs(25 * 60 * 60));
        write_chunk(&log, "new entry\n");

        let rotated: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("app_") && name.ends_with(".log"))
            .collect();
        assert_eq!(rotated.len(), 1, "expected one rotated file: {rotated:?}");

        let old = fs::read_to_string(dir.path().join(&rotated[0])).unwrap();
        assert!(old.contains("old entry"));

        let fresh = fs::read_to_string(&path).unwrap();
        assert!(fresh.contains(">>> log rotated"));
        assert!(fresh.contains("new entry"));
        assert!(!fresh.contains("old entry"));
    }
}
