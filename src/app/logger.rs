//! Logging setup (spec.md §6 `loglevel`/`logfile`; SPEC_FULL.md §A.3),
//! grounded in the teacher's `app/logger.rs`: a global `tracing-subscriber`
//! installed once at startup, verbosity taken from config rather than a CLI
//! flag since the wire format has no equivalent flag.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, LogLevel, LogTarget};

pub fn init(config: &Config) {
    let level = match config.loglevel {
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Notice => LevelFilter::INFO,
        LogLevel::Warning => LevelFilter::WARN,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.logfile {
        LogTarget::Stdout => builder.init(),
        LogTarget::File(path) => {
            // `Config::apply` already proved this path is append-openable.
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("logfile was validated during config apply");
            builder
                .with_ansi(false)
                .with_writer(move || file.try_clone().expect("clone logfile handle"))
                .init();
        }
    }

    tracing::info!("kvdoorman starting up (loglevel={:?})", config.loglevel);
}
