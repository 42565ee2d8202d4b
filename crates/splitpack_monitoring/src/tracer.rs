//! This module configures `tracing_subscriber` to write to a log file, standard output or a
//! Chrome trace.
//!
//! Only the log file is enabled by default.
use std::collections::HashSet;

use anyhow::anyhow;
use serde::Deserialize;
use serde::Serialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::from_env::{optional_var, FromEnvError};

pub const TRACING_MODE_VAR: &str = "SPLITPACK_TRACING_MODE";

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum TracerMode {
  /// Output the Tracer logs to Stdout
  Stdout,
  /// Output a Chrome profile
  Chrome,
}

impl TracerMode {
  /// Parses a comma separated list such as `stdout,chrome`. Duplicates are ignored.
  pub fn parse_list(value: &str) -> Result<Vec<Self>, FromEnvError> {
    let mut tracer_modes = vec![];
    let mut used_modes = HashSet::new();

    for mode in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
      let mode = match mode {
        "stdout" => Self::Stdout,
        "chrome" => Self::Chrome,
        value => {
          return Err(FromEnvError::InvalidKey(
            String::from(TRACING_MODE_VAR),
            anyhow!("Invalid value: {}", value),
          ))
        }
      };

      if used_modes.insert(mode) {
        tracer_modes.push(mode);
      }
    }

    Ok(tracer_modes)
  }

  pub fn from_env() -> Result<Vec<Self>, FromEnvError> {
    match optional_var(TRACING_MODE_VAR)? {
      Some(value) => Self::parse_list(&value),
      None => Ok(vec![]),
    }
  }
}

enum TracerGuard {
  #[allow(unused)]
  WorkerGuard(WorkerGuard),
  #[allow(unused)]
  ChromeGuard(tracing_chrome::FlushGuard),
}

/// Holds the writer guards; dropping the tracer flushes pending log lines
pub struct Tracer {
  #[allow(unused)]
  worker_guards: Vec<TracerGuard>,
}

impl Tracer {
  pub fn new(options: &[TracerMode]) -> anyhow::Result<Self> {
    let mut worker_guards = vec![];

    // Tracing is always written to the rolling log file
    let directory = std::env::temp_dir().join("splitpack_trace");
    let file_appender = tracing_appender::rolling::Builder::new()
      .rotation(tracing_appender::rolling::Rotation::HOURLY)
      .max_log_files(4)
      .filename_prefix("splitpack-tracing")
      .build(&directory)
      .map_err(|err| anyhow!(err))?;
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);

    let layer = tracing_subscriber::fmt::layer()
      .with_writer(non_blocking)
      .with_span_events(FmtSpan::CLOSE)
      .with_filter(EnvFilter::from_default_env());

    worker_guards.push(TracerGuard::WorkerGuard(worker_guard));

    let stdout_layer = if options.contains(&TracerMode::Stdout) {
      let (non_blocking, worker_guard) = tracing_appender::non_blocking(std::io::stdout());
      let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(EnvFilter::from_default_env());

      worker_guards.push(TracerGuard::WorkerGuard(worker_guard));

      Some(stdout_layer)
    } else {
      None
    };

    let chrome_layer = if options.contains(&TracerMode::Chrome) {
      let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .include_args(true)
        .build();

      worker_guards.push(TracerGuard::ChromeGuard(guard));

      Some(chrome_layer)
    } else {
      None
    };

    let subscriber = Registry::default()
      .with(layer)
      .with(stdout_layer)
      .with(chrome_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(Self { worker_guards })
  }
}
