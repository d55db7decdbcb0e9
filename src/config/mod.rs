//! Configuration file parsing (spec.md ยง6).
//!
//! The wire format is a bespoke line-oriented directive list, not
//! TOML/YAML, so the teacher's `serde`-driven config pipeline does not
//! transfer. The parsing *shape* is grounded in the teacher's own
//! hand-rolled, non-serde line parser for `pg_hba.conf`
//! (`src/pg_hba.rs::PgHbaConfig::parse`): split into lines, skip blank/`#`
//! lines, tokenize on whitespace, dispatch on the first token, and carry a
//! 1-based line number on every error.

use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Notice,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    File(String),
}

/// One `(seconds, changes)` snapshot-trigger rule (spec.md ยง3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveRule {
    pub seconds: u64,
    pub changes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub timeout: u64,
    pub port: u16,
    pub bind: String,
    pub save_rules: Vec<SaveRule>,
    pub dir: Option<PathBuf>,
    pub loglevel: LogLevel,
    pub logfile: LogTarget,
    pub databases: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timeout: 300,
            port: 6379,
            bind: "0.0.0.0".to_string(),
            save_rules: vec![
                SaveRule { seconds: 3600, changes: 1 },
                SaveRule { seconds: 300, changes: 100 },
                SaveRule { seconds: 60, changes: 10_000 },
            ],
            dir: None,
            loglevel: LogLevel::Notice,
            logfile: LogTarget::Stdout,
            databases: 16,
        }
    }
}

impl Config {
    /// Parse a config file, directives overriding defaults one at a time.
    /// A bare `save` directive on its first occurrence replaces the default
    /// rule set rather than appending to it (spec.md ยง6).
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Config::default();
        let mut save_overridden = false;

        for (idx, raw_line) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            let bad = |message: String| ConfigError::BadDirective {
                path: path.display().to_string(),
                line: line_no,
                message,
            };

            match parts[0] {
                "timeout" => {
                    let seconds = parse_arg::<u64>(&parts, 1, &bad)?;
                    if seconds < 1 {
                        return Err(bad("timeout must be >= 1".to_string()));
                    }
                    config.timeout = seconds;
                }
                "port" => {
                    let port = parse_arg::<u32>(&parts, 1, &bad)?;
                    if port < 1 || port > 65535 {
                        return Err(bad("port must be in 1..65535".to_string()));
                    }
                    config.port = port as u16;
                }
                "bind" => {
                    config.bind = require_arg(&parts, 1, &bad)?.to_string();
                }
                "save" => {
                    if parts.len() != 3 {
                        return Err(bad("save requires exactly 2 arguments".to_string()));
                    }
                    let seconds = parse_arg::<u64>(&parts, 1, &bad)?;
                    let changes = parse_arg::<u64>(&parts, 2, &bad)?;
                    if !save_overridden {
                        config.save_rules.clear();
                        save_overridden = true;
                    }
                    config.save_rules.push(SaveRule { seconds, changes });
                }
                "dir" => {
                    config.dir = Some(PathBuf::from(require_arg(&parts, 1, &bad)?));
                }
                "loglevel" => {
                    config.loglevel = match require_arg(&parts, 1, &bad)? {
                        "debug" => LogLevel::Debug,
                        "notice" => LogLevel::Notice,
                        "warning" => LogLevel::Warning,
                        other => return Err(bad(format!("unknown loglevel {other:?}"))),
                    };
                }
                "logfile" => {
                    let target = require_arg(&parts, 1, &bad)?;
                    config.logfile = if target == "stdout" {
                        LogTarget::Stdout
                    } else {
                        LogTarget::File(target.to_string())
                    };
                }
                "databases" => {
                    let count = parse_arg::<usize>(&parts, 1, &bad)?;
                    if count < 1 {
                        return Err(bad("databases must be >= 1".to_string()));
                    }
                    config.databases = count;
                }
                other => {
                    return Err(bad(format!("unknown directive {other:?}")));
                }
            }
        }

        Ok(config)
    }

    /// Validate the `logfile` directive by opening it in append mode, and
    /// `chdir` into `dir` if one was configured (spec.md ยง6).
    pub fn apply(&self) -> Result<(), ConfigError> {
        if let LogTarget::File(path) = &self.logfile {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::LogfileUnopenable {
                    path: path.clone(),
                    source,
                })?;
        }
        if let Some(dir) = &self.dir {
            std::env::set_current_dir(dir).map_err(|source| ConfigError::BadDir {
                dir: dir.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn require_arg<'a>(
    parts: &[&'a str],
    index: usize,
    bad: &dyn Fn(String) -> ConfigError,
) -> Result<&'a str, ConfigError> {
    parts
        .get(index)
        .copied()
        .ok_or_else(|| bad(format!("{} requires an argument", parts[0])))
}

fn parse_arg<T: std::str::FromStr>(
    parts: &[&str],
    index: usize,
    bad: &dyn Fn(String) -> ConfigError,
) -> Result<T, ConfigError> {
    let raw = require_arg(parts, index, bad)?;
    raw.parse::<T>()
        .map_err(|_| bad(format!("{} is not a valid number: {raw:?}", parts[0])))
}
