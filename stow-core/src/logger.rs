use crate::Error;
use std::{
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Fallback sink for failures of a [`DataService`](crate::DataService).
///
/// It must not depend on the store, so a broken store can still be reported.
pub trait Logger: Send + Sync {
    /// Record `message`, returns whether the entry was written.
    fn log(&self, message: &str, error: Option<&Error>) -> bool;
}

/// Forwards entries to the [`log`] facade at the error level.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn log(&self, message: &str, error: Option<&Error>) -> bool {
        match error {
            Some(error) => log::error!("{message}: {error:#}"),
            None => log::error!("{message}"),
        }
        true
    }
}

/// Appends timestamped entries to a text file, creating directory and file on first use.
#[derive(Debug)]
pub struct FileLogger {
    title: String,
    location: PathBuf,
    lock: Mutex<()>,
}

impl FileLogger {
    pub fn new(directory: impl AsRef<Path>, file_name: impl AsRef<Path>) -> Self {
        Self {
            title: "Stow file logger".into(),
            location: directory.as_ref().join(file_name),
            lock: Mutex::new(()),
        }
    }

    /// First line written to a new file.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn entry(message: &str, error: Option<&Error>) -> String {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let mut result = format!("{now} : {message}\n");
        if let Some(error) = error {
            let _ = writeln!(result, "ERROR : {error}");
            for cause in error.chain().skip(1) {
                let _ = writeln!(result, "CAUSED BY : {cause}");
            }
        }
        result.push('\n');
        result
    }

    fn write(&self, entry: &str) -> std::io::Result<()> {
        if let Some(directory) = self.location.parent().filter(|v| !v.as_os_str().is_empty()) {
            fs::create_dir_all(directory)?;
        }
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let is_new = !self.location.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.location)?;
        if is_new {
            writeln!(file, "{}\n", self.title)?;
        }
        file.write_all(entry.as_bytes())
    }
}

impl Logger for FileLogger {
    fn log(&self, message: &str, error: Option<&Error>) -> bool {
        match self.write(&Self::entry(message, error)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Could not write to the log file {}: {e}",
                    self.location.display()
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FileLogger, Logger};
    use crate::Error;
    use std::{env, fs, process};

    #[test]
    fn file_logger_appends_entries() {
        let directory = env::temp_dir().join(format!("stow-file-logger-{}", process::id()));
        let _ = fs::remove_dir_all(&directory);
        let logger = FileLogger::new(&directory, "errors.log").with_title("Test log");
        let error = Error::msg("connection refused").context("Store failure during insert");
        assert!(logger.log("first", None));
        assert!(logger.log("second", Some(&error)));
        let content = fs::read_to_string(logger.location()).unwrap();
        assert!(content.starts_with("Test log\n"));
        assert!(content.contains(" : first\n"));
        assert!(content.contains(" : second\n"));
        assert!(content.contains("ERROR : Store failure during insert\n"));
        assert!(content.contains("CAUSED BY : connection refused\n"));
        assert_eq!(content.matches("Test log").count(), 1);
        let _ = fs::remove_dir_all(directory);
    }
}
