use crossbeam_channel::{Receiver, Sender, unbounded};
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

pub mod message;

pub use message::{LogMessage, Severity};

/// Global logger instance
static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Log file configuration
const LOG_FILE_MAX_SIZE: u64 = 1024 * 1024; // 1MB
const LOG_FILE_MAX_COUNT: usize = 5;
const LOG_FILE_NAME: &str = "cyclescope.log";

/// File-based log writer with rotation
#[derive(Debug)]
pub struct LogFileWriter {
    log_dir: PathBuf,
    max_size: u64,
    current_file: Option<File>,
    current_size: u64,
}

impl LogFileWriter {
    /// Writer in `<data dir>/cyclescope/logs`.
    pub fn new() -> Result<Self, std::io::Error> {
        Self::in_dir(Self::default_log_directory())
    }

    pub fn in_dir<P: AsRef<Path>>(log_dir: P) -> Result<Self, std::io::Error> {
        let log_dir = log_dir.as_ref().to_path_buf();
        create_dir_all(&log_dir)?;
        Ok(LogFileWriter {
            log_dir,
            max_size: LOG_FILE_MAX_SIZE,
            current_file: None,
            current_size: 0,
        })
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    fn default_log_directory() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("cyclescope");
        path.push("logs");
        path
    }

    fn archive_path(&self, index: usize) -> PathBuf {
        self.log_dir.join(format!("{}.{}", LOG_FILE_NAME, index))
    }

    fn rotate_logs(&mut self) -> Result<(), std::io::Error> {
        self.current_file = None;

        let oldest = self.archive_path(LOG_FILE_MAX_COUNT - 1);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for i in (1..LOG_FILE_MAX_COUNT - 1).rev() {
            let old_path = self.archive_path(i);
            if old_path.exists() {
                std::fs::rename(&old_path, self.archive_path(i + 1))?;
            }
        }

        let current_path = self.log_file_path();
        if current_path.exists() {
            std::fs::rename(&current_path, self.archive_path(1))?;
        }

        self.current_size = 0;
        Ok(())
    }

    fn ensure_file_open(&mut self) -> Result<(), std::io::Error> {
        if self.current_file.is_none() {
            let path = self.log_file_path();
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
            self.current_file = Some(file);
        }
        Ok(())
    }

    pub fn write_log(&mut self, log_msg: &LogMessage) -> Result<(), std::io::Error> {
        self.ensure_file_open()?;

        let formatted_log = format!("{}\n", log_msg);
        let log_bytes = formatted_log.as_bytes();

        if self.current_size > 0 && self.current_size + log_bytes.len() as u64 > self.max_size {
            self.rotate_logs()?;
            self.ensure_file_open()?;
        }

        if let Some(ref mut file) = self.current_file {
            file.write_all(log_bytes)?;
            file.flush()?;
            self.current_size += log_bytes.len() as u64;
        }

        Ok(())
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}

/// Where log messages go.
#[derive(Debug, Clone)]
pub enum LoggerMode {
    /// Errors to stderr, everything else to stdout.
    Terminal,
    /// Messages are sent over a channel and never printed.
    Channel(Sender<LogMessage>),
    /// Rotating log file only.
    File,
    TerminalAndFile,
}

pub struct Logger {
    mode: Mutex<LoggerMode>,
    max_level: Mutex<Severity>,
    file_writer: Arc<Mutex<Option<LogFileWriter>>>,
}

impl Logger {
    pub fn new(mode: LoggerMode) -> Self {
        let logger = Logger {
            mode: Mutex::new(LoggerMode::Terminal),
            max_level: Mutex::new(Severity::Info),
            file_writer: Arc::new(Mutex::new(None)),
        };
        logger.set_mode(mode);
        logger
    }

    pub fn new_terminal() -> Self {
        Self::new(LoggerMode::Terminal)
    }

    pub fn new_channel(sender: Sender<LogMessage>) -> Self {
        Self::new(LoggerMode::Channel(sender))
    }

    /// Switches the sink, opening the log file if the new mode writes one.
    pub fn set_mode(&self, mode: LoggerMode) {
        if matches!(mode, LoggerMode::File | LoggerMode::TerminalAndFile) {
            if let Ok(mut file_writer) = self.file_writer.lock() {
                if file_writer.is_none() {
                    *file_writer = match LogFileWriter::new() {
                        Ok(writer) => Some(writer),
                        Err(e) => {
                            eprintln!("Failed to create log file writer: {}", e);
                            None
                        }
                    };
                }
            }
        }
        if let Ok(mut current) = self.mode.lock() {
            *current = mode;
        }
    }

    /// Uses `writer` for file output instead of the default location.
    pub fn set_file_writer(&self, writer: LogFileWriter) {
        if let Ok(mut file_writer) = self.file_writer.lock() {
            *file_writer = Some(writer);
        }
    }

    /// Drops messages less severe than `level`.
    pub fn set_max_level(&self, level: Severity) {
        if let Ok(mut max_level) = self.max_level.lock() {
            *max_level = level;
        }
    }

    pub fn max_level(&self) -> Severity {
        self.max_level.lock().map(|l| *l).unwrap_or(Severity::Info)
    }

    pub fn enabled(&self, level: Severity) -> bool {
        level <= self.max_level()
    }

    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.file_writer
            .lock()
            .ok()
            .and_then(|w| w.as_ref().map(|w| w.log_file_path()))
    }

    pub fn log(&self, level: Severity, msg: String) {
        if !self.enabled(level) {
            return;
        }
        let log_msg = LogMessage::new(level, msg);

        let write_to_file = |log_msg: &LogMessage| {
            if let Ok(mut file_writer) = self.file_writer.lock() {
                if let Some(writer) = file_writer.as_mut() {
                    if let Err(e) = writer.write_log(log_msg) {
                        eprintln!("Failed to write to log file: {}", e);
                    }
                }
            }
        };

        if let Ok(mode) = self.mode.lock() {
            match &*mode {
                LoggerMode::Terminal => write_to_terminal(&log_msg),
                LoggerMode::Channel(sender) => {
                    if sender.try_send(log_msg.clone()).is_err() {
                        eprintln!("Logger channel error: {}", log_msg);
                    }
                }
                LoggerMode::File => write_to_file(&log_msg),
                LoggerMode::TerminalAndFile => {
                    write_to_file(&log_msg);
                    write_to_terminal(&log_msg);
                }
            }
        }
    }

    pub fn debug(&self, msg: String) {
        self.log(Severity::Debug, msg);
    }

    pub fn info(&self, msg: String) {
        self.log(Severity::Info, msg);
    }

    pub fn warn(&self, msg: String) {
        self.log(Severity::Warn, msg);
    }

    pub fn error(&self, msg: String) {
        self.log(Severity::Error, msg);
    }

    pub fn fatal(&self, msg: String) {
        self.log(Severity::Fatal, msg);
    }
}

fn write_to_terminal(log_msg: &LogMessage) {
    match log_msg.level {
        Severity::Fatal | Severity::Error => {
            eprintln!("{}", log_msg);
            let _ = std::io::stderr().flush();
        }
        _ => {
            println!("{}", log_msg);
            let _ = std::io::stdout().flush();
        }
    }
}

/// Initialize the global logger with the given mode and filter.
/// Later calls only switch the mode and filter of the existing logger.
pub fn init(mode: LoggerMode, max_level: Severity) {
    let logger = GLOBAL_LOGGER.get_or_init(|| Logger::new(mode.clone()));
    logger.set_mode(mode);
    logger.set_max_level(max_level);
}

/// Create a logging channel pair
pub fn create_log_channel() -> (Sender<LogMessage>, Receiver<LogMessage>) {
    unbounded()
}

/// Get the global logger instance
pub fn get_logger() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(Logger::new_terminal)
}

pub fn get_log_file_path() -> Option<PathBuf> {
    get_logger().log_file_path()
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().debug(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        $crate::logger::get_logger().fatal(format!($($arg)*))
    };
}
