use std::rc::Rc;

use kvdoorman::app::{args, logger, server, ServerState};
use kvdoorman::config::Config;
use kvdoorman::store::Keyspace;
use kvdoorman::{errors::Error, snapshot};

fn main() {
    let args = args::parse();

    let config = match &args.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|err| {
            eprintln!("{err}");
            std::process::exit(1);
        }),
        None => Config::default(),
    };

    if let Err(err) = config.apply() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    logger::init(&config);

    let mut keyspace = Keyspace::new(config.databases);
    let snapshot_path = std::path::PathBuf::from(snapshot::DEFAULT_FILENAME);
    if let Err(err) = snapshot::load_from_path(&snapshot_path, &mut keyspace) {
        tracing::error!(%err, "failed to load snapshot, aborting");
        std::process::exit(1);
    }

    let server = Rc::new(ServerState::new(&config, keyspace));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .expect("failed to build tokio runtime");

    let local = tokio::task::LocalSet::new();
    let result: Result<(), Error> = local.block_on(&runtime, server::serve(&config, server));

    if let Err(err) = result {
        tracing::error!(%err, "server exited with an error");
        std::process::exit(1);
    }
}
