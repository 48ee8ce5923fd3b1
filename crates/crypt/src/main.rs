//! `crypt`: record-stream field cipher entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Open the invocation span.
//! 4. Load the identity directory and credential store.
//! 5. Read the key file and prepare the [`FieldCipher`] (all fatal checks).
//! 6. Stream stdin records through the cipher to stdout.

mod authz;
mod config;
mod credentials;
mod crypto;
mod driver;
mod keys;
mod pipeline;
mod telemetry;

#[cfg(test)]
mod fixtures;

use std::process::ExitCode;

use anyhow::{Context, Result};
use bytes::Bytes;
use common::CryptError;
use tracing::{error, info, info_span};
use uuid::Uuid;

use authz::RoleDirectory;
use config::Config;
use credentials::{CredentialStore, FileCredentialStore, NoCredentials};
use pipeline::{FieldCipher, Settings};

/// Exit status for an unusable configuration (`EX_CONFIG`).
const EXIT_CONFIG: u8 = 78;

fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }

    // -----------------------------------------------------------------------
    // 3. Invocation span
    // -----------------------------------------------------------------------
    let span = info_span!(
        "invocation",
        id = %Uuid::new_v4(),
        principal = %cfg.principal,
        mode = %cfg.mode
    );
    let _entered = span.enter();
    info!(version = env!("CARGO_PKG_VERSION"), key = %cfg.key, "crypt starting");

    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "crypt failed");
            match e.downcast_ref::<CryptError>() {
                Some(fatal) => ExitCode::from(fatal.exit_code()),
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cfg: &Config) -> Result<()> {
    // -----------------------------------------------------------------------
    // 4. Host collaborators
    // -----------------------------------------------------------------------
    let identities = RoleDirectory::from_path(&cfg.identity_file)?;
    let credentials: Box<dyn CredentialStore> = match &cfg.credentials_file {
        Some(path) => Box::new(FileCredentialStore::from_path(path)?),
        None => Box::new(NoCredentials),
    };

    // -----------------------------------------------------------------------
    // 5. Key + cipher preparation
    // -----------------------------------------------------------------------
    let key_bytes = std::fs::read(&cfg.key)
        .with_context(|| format!("failed to read key file {}", cfg.key))?;
    let cipher = FieldCipher::prepare(
        &Settings::from(cfg),
        &cfg.key,
        Bytes::from(key_bytes),
        &identities,
        credentials.as_ref(),
    )?;
    info!(fields = ?cipher.fields(), "cipher ready");

    // -----------------------------------------------------------------------
    // 6. Record stream
    // -----------------------------------------------------------------------
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    driver::run(&cipher, stdin.lock(), stdout.lock())?;
    Ok(())
}
