//! Size-rotating file writer

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing_subscriber::fmt::MakeWriter;

use super::config::{FileConfig, RotationConfig};
use super::error::LoggerError;

/// File writer that rotates by size.
///
/// Rotated files are numbered: `app.log.1` is the newest, `app.log.{max_files}`
/// the oldest. On an I/O failure the writer switches to stderr for the rest
/// of the process so log lines are never silently lost.
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
}

struct WriterState {
    path: PathBuf,
    rotation: RotationConfig,
    file: BufWriter<File>,
    current_size: u64,
    fallback_mode: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self, LoggerError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            std::fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                path: config.path.clone(),
                rotation: config.rotation,
                file,
                current_size,
                fallback_mode: false,
            })),
        })
    }

    pub fn is_in_fallback_mode(&self) -> bool {
        self.lock().fallback_mode
    }

    // A panic while holding the lock cannot leave the state half-written in a
    // way that matters for logging.
    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WriterState {
    fn write_line(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fallback_mode {
            return io::stderr().write(buf);
        }

        let incoming = buf.len() as u64;
        if self.current_size > 0 && self.current_size + incoming > self.rotation.max_size {
            if let Err(e) = self.rotate() {
                return self.fall_back(buf, e);
            }
        }

        match self.file.write_all(buf) {
            Ok(()) => {
                self.current_size += incoming;
                Ok(buf.len())
            }
            Err(e) => self.fall_back(buf, e),
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let oldest = rotated_path(&self.path, self.rotation.max_files);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for index in (1..self.rotation.max_files).rev() {
            let from = rotated_path(&self.path, index);
            if from.exists() {
                std::fs::rename(&from, rotated_path(&self.path, index + 1))?;
            }
        }
        std::fs::rename(&self.path, rotated_path(&self.path, 1))?;

        self.file = open_log_file(&self.path, false)?;
        self.current_size = 0;
        Ok(())
    }

    fn fall_back(&mut self, buf: &[u8], error: io::Error) -> io::Result<usize> {
        self.fallback_mode = true;
        eprintln!(
            "[logger] writing {} failed, falling back to stderr: {}",
            self.path.display(),
            error
        );
        io::stderr().write(buf)
    }
}

fn rotated_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    Ok(BufWriter::new(file))
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            writer: self.clone(),
        }
    }
}

/// One event's worth of writes; flushes on drop.
pub struct RotatingWriterGuard {
    writer: RotatingFileWriter,
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.lock().write_line(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.writer.lock();
        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

impl Drop for RotatingWriterGuard {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::LogFormat;

    fn file_config(path: PathBuf, max_size: u64, max_files: usize) -> FileConfig {
        FileConfig {
            enabled: true,
            path,
            append: true,
            format: LogFormat::Full,
            rotation: RotationConfig {
                max_size,
                max_files,
            },
        }
    }

    fn write_line(writer: &RotatingFileWriter, line: &str) {
        let mut guard = writer.make_writer();
        guard.write_all(line.as_bytes()).unwrap();
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");

        let writer = RotatingFileWriter::new(&file_config(path.clone(), 1024, 2)).unwrap();
        write_line(&writer, "hello\n");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!writer.is_in_fallback_mode());
    }

    #[test]
    fn test_rotates_when_size_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = RotatingFileWriter::new(&file_config(path.clone(), 10, 2)).unwrap();

        write_line(&writer, "aaaaaaaa\n");
        write_line(&writer, "bbbbbbbb\n");
        write_line(&writer, "cccccccc\n");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "cccccccc\n");
        assert_eq!(
            std::fs::read_to_string(rotated_path(&path, 1)).unwrap(),
            "bbbbbbbb\n"
        );
        assert_eq!(
            std::fs::read_to_string(rotated_path(&path, 2)).unwrap(),
            "aaaaaaaa\n"
        );
    }

    #[test]
    fn test_keeps_at_most_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = RotatingFileWriter::new(&file_config(path.clone(), 4, 2)).unwrap();

        for line in ["one\n", "two\n", "three\n", "four\n", "five\n"] {
            write_line(&writer, line);
        }

        assert!(rotated_path(&path, 2).exists());
        assert!(!rotated_path(&path, 3).exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "five\n");
    }

    #[test]
    fn test_append_counts_existing_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "existing-content\n").unwrap();

        let writer = RotatingFileWriter::new(&file_config(path.clone(), 20, 1)).unwrap();
        write_line(&writer, "next line\n");

        assert_eq!(
            std::fs::read_to_string(rotated_path(&path, 1)).unwrap(),
            "existing-content\n"
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "next line\n");
    }
}
