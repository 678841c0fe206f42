use anyhow::{Context, Result};
use clap::Parser;
use selfup::{Updater, UpdaterConfig, Version};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{App, Commands, CompareArg, Target, UpdateArg};
use crate::progress::ProgressTracker;

mod cli;
mod progress;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    match app.cmd {
        Commands::Check(target) => check(target).await,
        Commands::Update(arg) => update(arg).await,
        Commands::Compare(arg) => {
            println!("{}", compare(&arg)?);
            Ok(())
        }
    }
}

fn load_config(target: &Target) -> Result<UpdaterConfig> {
    let mut config = UpdaterConfig::load(&target.config)
        .with_context(|| format!("loading {}", target.config.display()))?;
    if let Some(url) = &target.manifest_url {
        config.manifest_url = url.clone();
    }
    Ok(config)
}

/// Token cancelled on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

async fn check(target: Target) -> Result<()> {
    let config = load_config(&target)?;
    let updater = Updater::from_config(&config)?;
    let cancel = cancel_on_interrupt();

    let result = updater
        .check(&config.manifest_url, &config.trusted_signers()?, &config.product_id, &cancel)
        .await;
    updater.shutdown().await;
    let result = match result {
        Err(e) if e.is_cancelled() => return Ok(()),
        other => other?,
    };

    println!("available: {}", result.package.version());
    match result.installed {
        Some(installed) => println!("installed: {installed}"),
        None => println!("installed: none"),
    }
    if let Some(changelog) = result.package.changelog_uri() {
        println!("changelog: {changelog}");
    }
    println!("update available: {}", result.update_available());
    Ok(())
}

async fn update(arg: UpdateArg) -> Result<()> {
    let config = load_config(&arg.target)?;
    let updater = Updater::from_config(&config)?;
    let cancel = cancel_on_interrupt();

    let result = match updater
        .check(&config.manifest_url, &config.trusted_signers()?, &config.product_id, &cancel)
        .await
    {
        Err(e) if e.is_cancelled() => {
            updater.shutdown().await;
            return Ok(());
        }
        other => other?,
    };
    updater.shutdown().await;

    if !arg.force && !result.update_available() {
        info!(version = %result.package.version(), "already up to date");
        return Ok(());
    }

    let package = &result.package;
    let tracker = ProgressTracker::new();
    let outcome = updater
        .download_and_install(package.uris(), package.hash(), package.arguments(), &cancel, &tracker)
        .await;
    match outcome {
        Ok(()) => {
            tracker.finish(Some(format!("installer for {} launched", package.version())));
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            tracker.abandon();
            Ok(())
        }
        Err(e) => {
            tracker.abandon();
            Err(e).context("update failed")
        }
    }
}

fn compare(arg: &CompareArg) -> Result<String> {
    let left = Version::parse(&arg.left)?;
    let right = Version::parse(&arg.right)?;
    let relation = match (left.is_newer(&right), right.is_newer(&left)) {
        (true, false) => "newer than",
        (false, true) => "older than",
        (false, false) => "equal to",
        (true, true) => "divergent from",
    };
    Ok(format!("{left} is {relation} {right}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(left: &str, right: &str) -> CompareArg {
        CompareArg {
            left:  left.into(),
            right: right.into(),
        }
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(&arg("2.0", "1.9.5")).unwrap(), "2.0 is divergent from 1.9.5");
        assert_eq!(compare(&arg("2.1", "2.0")).unwrap(), "2.1 is newer than 2.0");
        assert_eq!(compare(&arg("1.0.0.0", "1.0")).unwrap(), "1.0 is equal to 1.0");
        assert_eq!(compare(&arg("1.0", "1.0.0.1")).unwrap(), "1.0 is older than 1.0.0.1");
        assert!(compare(&arg("1.x", "1.0")).is_err());
    }
}
