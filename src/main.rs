//! kvm-updater - release feed checker and silent installer runner
//!
//! Entry point for the `kvm-updater` binary. Parses arguments, runs the
//! selected command and renders errors with suggestions.

use anyhow::Result;
use clap::Parser;
use kvm_updater::cli;
use kvm_updater::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
