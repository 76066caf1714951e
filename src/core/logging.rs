use crate::shared::paths::ensure_dir;
use std::collections::HashMap;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Targets that get their own log file. Everything else lands in `system.log`.
const ROUTED_TARGETS: [&str; 2] = ["records", "backup"];

pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

struct TargetWriter {
    writers: HashMap<String, NonBlocking>,
    system_writer: NonBlocking,
}

/// Picks the routed target owning `target`, matching `name` and `name::*`.
fn route_for<'a>(target: &str, names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    names.into_iter().find(|&name| {
        target == name
            || target
                .strip_prefix(name)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

impl<'a> MakeWriter<'a> for TargetWriter {
    type Writer = NonBlocking;

    fn make_writer(&'a self) -> Self::Writer {
        self.system_writer.clone()
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        match route_for(meta.target(), self.writers.keys().map(String::as_str)) {
            Some(name) => self.writers[name].clone(),
            None => self.system_writer.clone(),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing daily-rolled files under `log_dir`.
///
/// Falls back to stderr when the directory can't be created. Calling it
/// twice is harmless, the second subscriber is simply not installed.
pub fn init_logging(log_dir: &Path) -> LoggingGuards {
    if let Err(e) = ensure_dir(log_dir) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init();
        tracing::warn!(target: "system", "Failed to create logs directory {:?}: {}", log_dir, e);
        return LoggingGuards { _guards: Vec::new() };
    }

    let mut guards = Vec::new();
    let mut writers = HashMap::new();

    for target in ROUTED_TARGETS {
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, log_dir, format!("{}.log", target));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        writers.insert(target.to_string(), non_blocking);
        guards.push(guard);
    }

    let system_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "system.log");
    let (system_writer, system_guard) = tracing_appender::non_blocking(system_appender);
    guards.push(system_guard);

    let subscriber = tracing_subscriber::registry().with(env_filter()).with(
        tracing_subscriber::fmt::layer()
            .with_writer(TargetWriter {
                writers,
                system_writer,
            })
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::info!(target: "system", "Logging initialized at {:?}", log_dir);
    }

    LoggingGuards { _guards: guards }
}
