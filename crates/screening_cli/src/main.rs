//! Bootstrap check for `screening_core`.
//!
//! # Responsibility
//! - Resolve store config from the environment and open both stores.
//! - Print store statistics so wiring can be checked without an API layer.

use screening_core::db::{open_live_store, open_log_store};
use screening_core::{core_version, init_logging, DataAccess, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("screening_core version={}", core_version());

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = config.log_dir.as_ref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &StoreConfig) -> Result<(), screening_core::DbError> {
    let live = open_live_store(&config.live_path)?;
    let log = open_log_store(&config.log_path)?;
    println!(
        "live store={} documents={}",
        config.live_path.display(),
        live.document_count()?
    );
    println!(
        "log store={} entries={}",
        config.log_path.display(),
        log.document_count()?
    );

    let _access = DataAccess::open(live, log)?;
    println!("data access ready");
    Ok(())
}
