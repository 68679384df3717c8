//! Logging configuration and initialization.
//!
//! Presets are picked from CLI flags, individual targets can be overridden
//! with `--log TARGET=LEVEL`, and `RUST_LOG` wins over both. Logs go to
//! stderr; stdout carries transfer events.

use std::collections::HashMap;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Lifecycle events only
    #[default]
    Production,
    /// Adds status and session detail
    Verbose,
    /// Everything except per-line classifier output
    Debug,
    /// Everything, including raw process output
    Trace,
    /// Warnings and errors only
    Quiet,
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides (e.g., "burrow::process" -> DEBUG)
    pub overrides: HashMap<String, Level>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            preset: LogPreset::Production,
            overrides: HashMap::new(),
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        // "target=level" pairs, comma separated or repeated
        let mut overrides = HashMap::new();
        for override_str in log_overrides {
            for part in override_str.split(',') {
                if let Some((target, level_str)) = part.split_once('=') {
                    let target = target.trim();
                    let full_target = if target == "burrow" || target.starts_with("burrow::") {
                        target.to_string()
                    } else {
                        format!("burrow::{}", target)
                    };

                    if let Ok(level) = level_str.trim().parse::<Level>() {
                        overrides.insert(full_target, level);
                    }
                }
            }
        }

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Filter directives for the preset, followed by the per-target overrides.
    pub fn directives(&self) -> Vec<String> {
        let preset: &[&str] = match self.preset {
            LogPreset::Production => &[
                "warn",
                "burrow::startup=info",
                "burrow::cli=info",
                "burrow::orchestrator=info",
                "burrow::process=info",
                "burrow::registry=info",
                "burrow::notify=info",
                "burrow::session=warn",
                "burrow::classifier=off",
            ],
            LogPreset::Verbose => &["warn", "burrow=info", "burrow::classifier=off"],
            LogPreset::Debug => &["info", "burrow=debug", "burrow::classifier=off"],
            LogPreset::Trace => &["debug", "burrow=trace"],
            LogPreset::Quiet => &["error", "burrow=warn"],
        };

        let mut directives: Vec<String> = preset.iter().map(|d| d.to_string()).collect();
        let mut overrides: Vec<_> = self.overrides.iter().collect();
        overrides.sort_by(|a, b| a.0.cmp(b.0));
        directives.extend(
            overrides
                .into_iter()
                .map(|(target, level)| format!("{}={}", target, level.as_str().to_lowercase())),
        );
        directives
    }

    /// `RUST_LOG` when set, otherwise [`LogConfig::directives`].
    pub fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.directives().join(",")))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Install the global subscriber. Logs go to stderr.
pub fn init(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.build_filter());
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    match config.format {
        LogFormat::Text => registry.with(layer.without_time()).init(),
        LogFormat::Json => registry.with(layer.json().with_current_span(false)).init(),
    }
}
