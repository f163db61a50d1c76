//! Size-bounded rotating log file.
//!
//! # Responsibilities
//! - Append to a live log file, creating it (and its directory) lazily
//! - Rotate the live file into a timestamped backup when it would grow past
//!   the size limit
//! - Compress backups and prune them by count and age
//!
//! # Design Decisions
//! - All writes and rotations happen under one mutex, so concurrent writers
//!   never interleave lines or race a rotation
//! - Backup names embed a fixed-width UTC timestamp
//!   (`app-2024-05-01T10-00-00.000.log[.gz]`) so lexical order is
//!   chronological order
//! - Compression and pruning run synchronously right after the rename

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::FileSinkConfig;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESSED_SUFFIX: &str = ".gz";

/// Limits applied to the live file and its backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Maximum size of the live file in bytes.
    pub max_size: u64,
    /// Maximum number of backups kept; 0 keeps all.
    pub max_backups: usize,
    /// Backups older than this are deleted.
    pub max_age: Option<Duration>,
    /// Gzip backups after rotation.
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 5 * 1024 * 1024,
            max_backups: 10,
            max_age: Some(Duration::from_secs(14 * 24 * 60 * 60)),
            compress: true,
        }
    }
}

impl From<&FileSinkConfig> for RotationPolicy {
    fn from(config: &FileSinkConfig) -> Self {
        Self {
            max_size: config.max_size_mb.saturating_mul(1024 * 1024),
            max_backups: config.max_backups,
            max_age: (config.max_age_days > 0)
                .then(|| Duration::from_secs(config.max_age_days * 24 * 60 * 60)),
            compress: config.compress,
        }
    }
}

/// A rotated-out copy of the log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    pub rotated_at: DateTime<Utc>,
    pub compressed: bool,
}

/// Thread-safe rotating file writer.
pub struct RollingFile {
    state: Mutex<RollingState>,
}

struct RollingState {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    size: u64,
    last_rotation: Option<DateTime<Utc>>,
}

impl RollingFile {
    /// Create a writer for `path`. Nothing touches the disk until the first write.
    pub fn new(path: impl Into<PathBuf>, policy: RotationPolicy) -> Self {
        Self {
            state: Mutex::new(RollingState {
                path: path.into(),
                policy,
                file: None,
                size: 0,
                last_rotation: None,
            }),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Force a rotation regardless of the current size.
    pub fn rotate(&self) -> io::Result<()> {
        self.lock().rotate()
    }

    /// Existing backups, newest first.
    pub fn backups(&self) -> io::Result<Vec<Backup>> {
        self.lock().backups()
    }

    fn lock(&self) -> MutexGuard<'_, RollingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for &RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = &'a RollingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

impl RollingState {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.policy.max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.policy.max_size
                ),
            ));
        }

        if self.file.is_none() {
            self.open_existing()?;
        }
        if self.size + len > self.policy.max_size {
            self.rotate()?;
        }

        let file = match self.file.as_mut() {
            Some(file) => file,
            None => return Err(io::Error::new(io::ErrorKind::NotFound, "log file is not open")),
        };
        file.write_all(buf)?;
        self.size += len;
        Ok(buf.len())
    }

    fn open_existing(&mut self) -> io::Result<()> {
        fs::create_dir_all(self.dir())?;
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;
        fs::create_dir_all(self.dir())?;

        if self.path.exists() {
            let rotated_at = self.next_rotation_time();
            let backup = self.dir().join(self.backup_name(rotated_at));
            fs::rename(&self.path, backup)?;
            self.last_rotation = Some(rotated_at);
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.file = Some(file);
        self.size = 0;

        // Housekeeping failures must not stop logging into the new file.
        let _ = self.prune_and_compress();
        Ok(())
    }

    /// Current time, bumped past the previous rotation's millisecond so names
    /// stay unique.
    fn next_rotation_time(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.last_rotation {
            Some(last) if now.timestamp_millis() <= last.timestamp_millis() => {
                last + TimeDelta::milliseconds(1)
            }
            _ => now,
        }
    }

    fn prune_and_compress(&self) -> io::Result<()> {
        let mut backups = self.backups()?;
        let mut expired = Vec::new();

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            expired.extend(backups.split_off(self.policy.max_backups));
        }

        if let Some(cutoff) = self.age_cutoff() {
            let (keep, old): (Vec<_>, Vec<_>) =
                backups.into_iter().partition(|b| b.rotated_at >= cutoff);
            backups = keep;
            expired.extend(old);
        }

        for backup in &expired {
            let _ = fs::remove_file(&backup.path);
        }

        if self.policy.compress {
            for backup in backups.iter().filter(|b| !b.compressed) {
                let _ = compress(&backup.path);
            }
        }
        Ok(())
    }

    fn age_cutoff(&self) -> Option<DateTime<Utc>> {
        let max_age = TimeDelta::from_std(self.policy.max_age?).ok()?;
        Utc::now().checked_sub_signed(max_age)
    }

    fn backups(&self) -> io::Result<Vec<Backup>> {
        let (prefix, ext) = self.name_parts();
        let mut backups = Vec::new();

        let entries = match fs::read_dir(self.dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(backups),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let (stem, compressed) = match name.strip_suffix(COMPRESSED_SUFFIX) {
                Some(stem) => (stem, true),
                None => (name, false),
            };
            let Some(timestamp) = stem
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_suffix(ext.as_str()))
            else {
                continue;
            };
            let Ok(parsed) = NaiveDateTime::parse_from_str(timestamp, BACKUP_TIME_FORMAT) else {
                continue;
            };
            backups.push(Backup {
                path: entry.path(),
                rotated_at: parsed.and_utc(),
                compressed,
            });
        }

        backups.sort_by(|a, b| b.rotated_at.cmp(&a.rotated_at));
        Ok(backups)
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// `logs/app.log` splits into (`app-`, `.log`).
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("log");
        let ext = self
            .path
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (format!("{}-", stem), ext)
    }

    fn backup_name(&self, rotated_at: DateTime<Utc>) -> String {
        let (prefix, ext) = self.name_parts();
        format!("{}{}{}", prefix, rotated_at.format(BACKUP_TIME_FORMAT), ext)
    }
}

/// Gzip `path` into `path.gz` and remove the original.
fn compress(path: &Path) -> io::Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(COMPRESSED_SUFFIX);
    let target = PathBuf::from(target);

    let result = (|| {
        let mut source = File::open(path)?;
        let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
        io::copy(&mut source, &mut encoder)?;
        encoder.finish()?.sync_all()
    })();

    match result {
        Ok(()) => fs::remove_file(path),
        Err(e) => {
            let _ = fs::remove_file(&target);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn policy(max_size: u64, max_backups: usize) -> RotationPolicy {
        RotationPolicy {
            max_size,
            max_backups,
            max_age: None,
            compress: true,
        }
    }

    fn write_line(file: &RollingFile, n: usize) {
        let line = format!("{{\"message\":\"record {:04}\"}}\n", n);
        (&*file).write_all(line.as_bytes()).unwrap();
    }

    fn read_backup(backup: &Backup) -> String {
        let mut content = String::new();
        if backup.compressed {
            GzDecoder::new(File::open(&backup.path).unwrap())
                .read_to_string(&mut content)
                .unwrap();
        } else {
            content = fs::read_to_string(&backup.path).unwrap();
        }
        content
    }

    #[test]
    fn test_lazy_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");
        let file = RollingFile::new(&path, policy(1024, 3));
        assert!(!path.exists());

        write_line(&file, 1);
        assert!(path.exists());
        assert_eq!(file.path(), path);
    }

    #[test]
    fn test_rotation_preserves_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        // Each line is 26 bytes, so two lines fit per file.
        let file = RollingFile::new(&path, policy(60, 10));

        for n in 0..9 {
            write_line(&file, n);
        }

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 4);
        assert!(backups.iter().all(|b| b.compressed));

        let mut content: String = backups.iter().rev().map(read_backup).collect();
        content.push_str(&fs::read_to_string(&path).unwrap());

        let expected: String = (0..9)
            .map(|n| format!("{{\"message\":\"record {:04}\"}}\n", n))
            .collect();
        assert_eq!(content, expected);
    }

    #[test]
    fn test_concurrent_writers_never_tear_or_lose_lines() {
        const THREADS: usize = 8;
        const LINES: usize = 250;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RollingFile::new(&path, policy(256, 0));

        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let file = &file;
                scope.spawn(move || {
                    for n in 0..LINES {
                        let line = format!("thread {:02} line {:04}\n", t, n);
                        (&*file).write_all(line.as_bytes()).unwrap();
                    }
                });
            }
        });

        let backups = file.backups().unwrap();
        assert!(backups.len() > 1);
        let mut content: String = backups.iter().map(read_backup).collect();
        content.push_str(&fs::read_to_string(&path).unwrap());

        let mut lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), THREADS * LINES);
        lines.sort_unstable();
        let mut expected: Vec<String> = (0..THREADS)
            .flat_map(|t| (0..LINES).map(move |n| format!("thread {:02} line {:04}", t, n)))
            .collect();
        expected.sort_unstable();
        assert_eq!(lines, expected);
    }

    #[test]
    fn test_backup_count_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RollingFile::new(&path, policy(60, 3));

        for n in 0..30 {
            write_line(&file, n);
        }

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 3);

        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 4, "live file plus three backups");

        // The newest backup holds the two records written just before the live file.
        assert!(read_backup(&backups[0]).contains("record 0027"));
    }

    #[test]
    fn test_uncompressed_backups_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RollingFile::new(
            &path,
            RotationPolicy {
                compress: false,
                ..policy(60, 5)
            },
        );

        for n in 0..3 {
            write_line(&file, n);
        }

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(!backups[0].compressed);
        assert!(backups[0].path.extension().unwrap() == "log");
    }

    #[test]
    fn test_old_backups_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let stale = dir.path().join("app-2000-01-01T00-00-00.000.log.gz");
        fs::write(&stale, b"old").unwrap();

        let file = RollingFile::new(
            &path,
            RotationPolicy {
                max_age: Some(Duration::from_secs(24 * 60 * 60)),
                ..policy(1024, 10)
            },
        );
        write_line(&file, 1);
        file.rotate().unwrap();

        assert!(!stale.exists());
        assert_eq!(file.backups().unwrap().len(), 1);
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(dir.path().join("other.log"), b"keep").unwrap();
        fs::write(dir.path().join("app-not-a-date.log"), b"keep").unwrap();

        let file = RollingFile::new(&path, policy(1024, 1));
        write_line(&file, 1);
        file.rotate().unwrap();
        write_line(&file, 2);
        file.rotate().unwrap();

        assert_eq!(file.backups().unwrap().len(), 1);
        assert!(dir.path().join("other.log").exists());
        assert!(dir.path().join("app-not-a-date.log").exists());
    }

    #[test]
    fn test_oversized_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = RollingFile::new(dir.path().join("app.log"), policy(10, 1));

        let err = (&file).write(b"this line is far too long").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_existing_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"earlier\n").unwrap();

        let file = RollingFile::new(&path, policy(1024, 1));
        write_line(&file, 1);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier\n"));
        assert!(file.backups().unwrap().is_empty());
    }

    #[test]
    fn test_policy_from_config() {
        let config = FileSinkConfig::default();
        let policy = RotationPolicy::from(&config);
        assert_eq!(policy, RotationPolicy::default());
    }
}
