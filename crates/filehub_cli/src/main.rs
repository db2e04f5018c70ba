//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a data directory the way the portal does at startup.
//! - Seed the default admin and verify the category forest.
//! - Print deterministic per-partition counts for quick sanity checks.

use filehub_core::{init_logging, CoreConfig, CoreContext, EntityKind};
use log::{error, info};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env file is normal; variables may come from the shell.
    let _ = dotenvy::dotenv();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("filehub: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let context = CoreContext::open(&config)?;
    println!("filehub_core version={}", filehub_core::core_version());
    println!("data_dir={}", context.store().root().display());

    if let Some(seed) = &config.admin_seed {
        match context.accounts().ensure_default_admin(seed)? {
            Some(admin) => println!("admin_seed=created id={}", admin.id),
            None => println!("admin_seed=skipped"),
        }
    }

    let verified = context.hierarchy().verify_forest()?;
    println!("categories_verified={verified}");

    for kind in EntityKind::ALL {
        println!("{kind}={}", context.store().count(kind));
    }
    info!("event=cli_smoke module=cli status=ok categories_verified={verified}");
    Ok(())
}
