use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Environment variable holding a filter directive that replaces the `-v` level,
/// e.g. `CYCLOBIND_LOG=cyclobind::engine::bridge=trace`.
pub const LOG_ENV_VAR: &str = "CYCLOBIND_LOG";

pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn build_filter(verbosity: u8, quiet: bool, directive: Option<&str>) -> Result<EnvFilter> {
    let level = level_filter(verbosity, quiet);
    match directive {
        Some(directive) if !quiet => EnvFilter::builder()
            .with_default_directive(level.into())
            .parse(directive)
            .map_err(|e| CliError::Argument(format!("Invalid {} value: {}", LOG_ENV_VAR, e))),
        _ => Ok(EnvFilter::default().add_directive(level.into())),
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path).map_err(CliError::Io)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let directive = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(verbosity, quiet, directive.as_deref())?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(open_log_file(path)?)
                .with_ansi(false)
                .with_target(true),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info, warn};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(7, false), LevelFilter::TRACE);
        assert_eq!(level_filter(3, true), LevelFilter::OFF);
    }

    #[test]
    fn env_directive_is_validated_and_ignored_when_quiet() {
        assert!(build_filter(1, false, Some("cyclobind=debug")).is_ok());
        assert!(matches!(
            build_filter(1, false, Some("cyclobind=loud")),
            Err(CliError::Argument(_))
        ));
        assert!(build_filter(0, true, Some("cyclobind=loud")).is_ok());
    }

    #[test]
    #[serial]
    fn file_layer_receives_events_at_selected_level() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("logs").join("design.log");

        let file = open_log_file(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry()
            .with(build_filter(1, false, None).unwrap())
            .with(fmt::layer().with_writer(file).with_ansi(false));

        tracing::subscriber::with_default(subscriber, || {
            info!("Trial 0 saved.");
            warn!("Engine reported no best trial log.");
            debug!("Running design step.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Trial 0 saved."));
        assert!(content.contains("WARN"));
        assert!(!content.contains("Running design step."));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_propagates_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, false, Some(temp_dir.path()));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
