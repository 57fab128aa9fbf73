//! `picgrab update` – check the manifest and self-update.

use anyhow::{Context, Result};
use picgrab_core::config::PicgrabConfig;
use picgrab_core::http::HttpClient;
use picgrab_core::update::{self, UpdateCheck};
use std::io::Write;

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn run_update(cfg: &PicgrabConfig, check_only: bool) -> Result<()> {
    let manifest_url = cfg.update.manifest_url.trim().to_string();
    if manifest_url.is_empty() {
        anyhow::bail!("no [update] manifest_url configured");
    }
    let client = HttpClient::from_config(cfg);

    let check = tokio::task::spawn_blocking({
        let client = client.clone();
        move || update::check_for_update(&client, &manifest_url, CURRENT_VERSION)
    })
    .await
    .context("update check task join")??;

    let (version, asset) = match check {
        UpdateCheck::UpToDate { latest } => {
            println!("picgrab {} is up to date (latest {}).", CURRENT_VERSION, latest);
            return Ok(());
        }
        UpdateCheck::Available { version, asset } => (version, asset),
    };
    println!("Update available: {} -> {}", CURRENT_VERSION, version);
    if check_only {
        return Ok(());
    }

    let current_exe = std::env::current_exe().context("locate running executable")?;
    let new_exe = tokio::task::spawn_blocking(move || {
        update::download_verified(&client, &asset, &version, &mut |pct| {
            eprint!("\rDownloading update: {:>3}%", pct);
            let _ = std::io::stderr().flush();
        })
    })
    .await
    .context("update download task join")??;
    eprintln!();

    if let Err(e) = update::apply_update(&current_exe, &new_exe) {
        let _ = std::fs::remove_file(&new_exe);
        return Err(e.into());
    }
    println!("Installing update; picgrab will restart.");
    std::process::exit(0);
}
