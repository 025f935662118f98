use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use overlay_core::paths;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Colored terminal logger that mirrors plain lines into the log file.
pub struct OverlayLogger {
    max_level: Level,
    log_file: Mutex<Option<File>>,
    target_colors: Mutex<HashMap<String, usize>>,
}

impl OverlayLogger {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let log_file = paths::log_file_path().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .map_err(|e| eprintln!("Warning: Failed to open log file at {:?}: {}", path, e))
                .ok()
        });

        Self {
            max_level: Self::level_for(quiet, verbose),
            log_file: Mutex::new(log_file),
            target_colors: Mutex::new(HashMap::new()),
        }
    }

    fn level_for(quiet: bool, verbose: bool) -> Level {
        if quiet {
            Level::Info
        } else if verbose {
            Level::Trace
        } else {
            Level::Debug
        }
    }

    fn color_for_target(&self, target: &str) -> String {
        // Palette of colors that work well when dimmed
        let colors: &[fn(&str) -> ColoredString] = &[
            |s| s.green(),
            |s| s.yellow(),
            |s| s.blue(),
            |s| s.magenta(),
            |s| s.cyan(),
            |s| s.purple(),
        ];

        let index = {
            let mut target_colors = self
                .target_colors
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let next = target_colors.len();
            *target_colors
                .entry(target.to_string())
                .or_insert(next % colors.len())
        };

        colors[index](target).to_string()
    }

    fn level_tag(level: Level) -> &'static str {
        match level {
            Level::Error => "[E]",
            Level::Warn => "[W]",
            Level::Info => "[I]",
            Level::Debug => "[D]",
            Level::Trace => "[T]",
        }
    }

    fn short_target<'a>(record: &'a Record) -> Option<&'a str> {
        let target = record.target();
        if target.is_empty() {
            return None;
        }
        Some(target.rsplit("::").next().unwrap_or(target))
    }

    fn format_log(&self, record: &Record) -> String {
        let level_str = Self::level_tag(record.level());
        let target = Self::short_target(record)
            .map(|target| format!("[{}] ", self.color_for_target(target).dimmed()))
            .unwrap_or_default();

        let message = format!("{} {}{}", level_str, target, record.args());

        match record.level() {
            Level::Error => message.red().bold().to_string(),
            Level::Warn => message.yellow().bold().to_string(),
            level => {
                let colored_level = match level {
                    Level::Info => level_str.green().bold(),
                    Level::Debug => level_str.blue().bold(),
                    _ => level_str.white().bold(),
                };
                message.replacen(level_str, &colored_level.to_string(), 1)
            }
        }
    }

    fn format_log_plain(record: &Record) -> String {
        let target = Self::short_target(record)
            .map(|target| format!("[{}] ", target))
            .unwrap_or_default();
        format!(
            "{} {}{}",
            Self::level_tag(record.level()),
            target,
            record.args()
        )
    }
}

impl Log for OverlayLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        println!("{}", self.format_log(record));

        let mut file = self.log_file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = file.as_mut() {
            let _ = writeln!(file, "{}", Self::format_log_plain(record));
        }
    }

    fn flush(&self) {
        let mut file = self.log_file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = file.as_mut() {
            let _ = file.flush();
        }
    }
}

pub fn init_logger(quiet: bool, verbose: bool) -> Result<(), log::SetLoggerError> {
    let logger = OverlayLogger::new(quiet, verbose);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
