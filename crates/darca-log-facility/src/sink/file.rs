use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use parking_lot::Mutex;

use super::{Sink, SinkKind};
use crate::{errors::LogError, format::FormatStyle, record::Record};

/// Writes records to `{directory}/{name}.log`, rotating by size.
///
/// Rolling moves `name.log` to `name.log.1`, shifting older copies up and
/// dropping whatever lands beyond `backup_count`. A limit of `0` or a
/// `backup_count` of `0` disables rolling.
pub struct FileSink {
    path: PathBuf,
    max_bytes: u64,
    rolls: bool,
    style: FormatStyle,
    writer: Mutex<FileRotate<AppendCount>>,
}

impl FileSink {
    /// Create `directory` if it is missing and open the logger's file in it.
    pub fn open(
        directory: &Path,
        name: &str,
        max_bytes: u64,
        backup_count: usize,
        style: FormatStyle,
    ) -> Result<Self, LogError> {
        fs::create_dir_all(directory).map_err(|source| LogError::CreateDirectory {
            path: directory.to_path_buf(),
            source,
        })?;

        let path = directory.join(format!("{name}.log"));
        // The rotating writer carries on without a file when it cannot open
        // one, so an unwritable path is reported here.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::OpenFile {
                path: path.clone(),
                source,
            })?;

        let writer = FileRotate::new(
            &path,
            AppendCount::new(backup_count),
            ContentLimit::None,
            Compression::None,
            #[cfg(unix)]
            None,
        );

        Ok(Self {
            path,
            max_bytes,
            rolls: max_bytes > 0 && backup_count > 0,
            style,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `bytes` as one unit, rolling the file over first if they would
    /// push it past the limit.
    fn append(&self, bytes: &[u8]) -> Result<(), LogError> {
        let mut writer = self.writer.lock();

        if self.should_roll(bytes.len() as u64) {
            writer.rotate().map_err(|source| LogError::Rotate {
                path: self.path.clone(),
                source,
            })?;
            tracing::debug!(path = %self.path.display(), "rotated log file");
        }

        writer
            .write_all(bytes)
            .map_err(|source| LogError::Write {
                target: self.path.display().to_string(),
                source,
            })
    }

    // Size comes from the filesystem; an empty file is never rolled, even for
    // a record larger than the limit.
    fn should_roll(&self, incoming: u64) -> bool {
        if !self.rolls {
            return false;
        }
        let size = fs::metadata(&self.path).map_or(0, |meta| meta.len());
        size > 0 && size.saturating_add(incoming) > self.max_bytes
    }
}

impl Sink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn write(&self, record: &Record<'_>) -> Result<(), LogError> {
        let mut line = self.style.render(record)?;
        line.push('\n');
        self.append(line.as_bytes())
    }

    fn flush(&self) -> Result<(), LogError> {
        self.writer
            .lock()
            .flush()
            .map_err(|source| LogError::Write {
                target: self.path.display().to_string(),
                source,
            })
    }
}
