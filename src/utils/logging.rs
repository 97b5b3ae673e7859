// Sun Jul 26 2026 - Alex

use std::sync::atomic::{AtomicBool, Ordering};

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Installs the stderr logger. `RUST_LOG` takes precedence over the CLI
/// level so the env_logger filter syntax keeps working.
pub fn init(level: &str, use_color: bool) {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
        return;
    }
    let level = level_from_str(level);
    let logger = Box::new(ColoredLogger::new(level, use_color));
    log::set_boxed_logger(logger).ok();
    log::set_max_level(level);
}

pub fn level_from_str(s: &str) -> LevelFilter {
    match s.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

struct ColoredLogger {
    level: LevelFilter,
    use_color: AtomicBool,
}

impl ColoredLogger {
    fn new(level: LevelFilter, use_color: bool) -> Self {
        Self { level, use_color: AtomicBool::new(use_color) }
    }

    fn format_level(&self, level: Level) -> ColoredString {
        match level {
            Level::Error => "ERROR".red().bold(),
            Level::Warn => "WARN ".yellow().bold(),
            Level::Info => "INFO ".green().bold(),
            Level::Debug => "DEBUG".blue().bold(),
            Level::Trace => "TRACE".magenta().bold(),
        }
    }
}

impl Log for ColoredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let level_str = if self.use_color.load(Ordering::Relaxed) {
                self.format_level(record.level()).to_string()
            } else {
                format!("{:5}", record.level())
            };
            let target = format!("[{}]", record.target());
            eprintln!("{} {} {}", level_str, target.dimmed(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Logs how long a phase took when it goes out of scope.
pub struct ScopedTimer {
    name: String,
    start: std::time::Instant,
}

impl ScopedTimer {
    pub fn new(name: &str) -> Self {
        log::debug!("[TIMER] {} started", name);
        Self { name: name.to_string(), start: std::time::Instant::now() }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        log::debug!("[TIMER] {} took {:.2}ms", self.name, elapsed.as_secs_f64() * 1000.0);
    }
}
