use {
    log::{Level, Log, Metadata, Record},
    std::{
        io::{Write, stderr},
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering::Relaxed},
        },
        time::SystemTime,
    },
};

pub struct Logger {
    level: AtomicU32,
}

impl Logger {
    pub fn install_stderr(level: Level) -> Arc<Self> {
        let slf = Arc::new(Self {
            level: AtomicU32::new(level as _),
        });
        let res = log::set_boxed_logger(Box::new(LogWrapper {
            logger: slf.clone(),
        }));
        if res.is_ok() {
            log::set_max_level(level.to_level_filter());
        }
        slf
    }
}

struct LogWrapper {
    logger: Arc<Logger>,
}

impl Log for LogWrapper {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() as u32 <= self.logger.level.load(Relaxed)
    }

    fn log(&self, record: &Record) {
        if record.level() as u32 > self.logger.level.load(Relaxed) {
            return;
        }
        let now = humantime::format_rfc3339_millis(SystemTime::now());
        let line = match record.module_path() {
            Some(mp) => format!("[{} {:5} {}] {}\n", now, record.level(), mp, record.args()),
            None => format!("[{} {:5}] {}\n", now, record.level(), record.args()),
        };
        let _ = stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = stderr().flush();
    }
}
