//! tracing-subscriber setup for the CLI.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const FANOUT_LOG_ENV_VAR: &str = "FANOUT_LOG";

/// Crates whose level follows `FANOUT_LOG` unless `RUST_LOG` names them.
const FANOUT_CRATES: &[&str] = &[
  "fanout",
  "fanout_config",
  "fanout_connector",
  "fanout_executor",
  "fanout_table",
];

/// Install a stderr fmt subscriber. Stdout is reserved for the result table.
pub fn init() {
  let (env_filter, log_level) = env_filter_and_log_level();

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .init();

  tracing::debug!("log level: {}", log_level);
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
  let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
  let mut env_filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::WARN.into())
    .parse_lossy(&directive_string);

  let log_level = std::env::var(FANOUT_LOG_ENV_VAR).unwrap_or_else(|_| "info".to_string());

  for crate_name in FANOUT_CRATES {
    if directive_string.contains(&format!("{crate_name}=")) {
      continue;
    }
    // An unparseable level leaves the crate at the default directive.
    if let Ok(directive) = format!("{crate_name}={log_level}").parse() {
      env_filter = env_filter.add_directive(directive);
    }
  }

  (env_filter, log_level)
}
