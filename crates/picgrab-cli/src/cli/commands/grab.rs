//! `picgrab grab` – scan pages and download their images.

use anyhow::{Context, Result};
use picgrab_core::config::{clamp_workers, GrabConfig, PicgrabConfig};
use picgrab_core::control::CancelToken;
use picgrab_core::downloader::{AllowList, DownloadOptions};
use picgrab_core::http::HttpClient;
use picgrab_core::scheduler::{run_grab, EventSink, GrabRequest, RunEvent};
use std::io::Write;

use crate::cli::GrabArgs;

/// Page URLs from a list file: one per line, blank lines and `#` comments skipped.
pub fn read_page_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Config defaults with command-line overrides applied.
pub fn build_options(cfg: &GrabConfig, args: &GrabArgs) -> DownloadOptions {
    let mut opts = DownloadOptions::from_config(cfg);
    if let Some(out) = &args.out {
        opts.output_dir = out.clone();
    }
    if let Some(allow) = &args.allow {
        opts.allow_extensions = AllowList::parse(allow);
    }
    if let Some(min) = args.min_bytes {
        opts.min_bytes = min;
    }
    if args.accept_data_urls {
        opts.accept_data_urls = true;
    }
    if args.no_auto_referer {
        opts.referer.auto_from_page = false;
    }
    if let Some(r) = &args.referer {
        opts.referer.explicit = Some(r.clone());
    }
    if let Some(n) = args.workers {
        opts.workers = clamp_workers(n);
    }
    opts
}

pub async fn run_grab_command(cfg: &PicgrabConfig, args: GrabArgs) -> Result<()> {
    let mut pages = args.urls.clone();
    if let Some(list) = &args.list {
        let text = std::fs::read_to_string(list)
            .with_context(|| format!("read page list {}", list.display()))?;
        pages.extend(read_page_list(&text));
    }
    if pages.is_empty() {
        anyhow::bail!("no page URL given (pass URLs or --list FILE)");
    }
    let options = build_options(&cfg.grab, &args);
    let client = HttpClient::from_config(cfg);
    let cancel = CancelToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nStopping after in-flight downloads…");
                cancel.cancel();
            }
        }
    });

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let run = tokio::spawn(run_grab(
        GrabRequest { pages, options },
        client,
        cancel,
        EventSink::new(tx),
    ));

    let mut finished = None;
    while let Some(event) = rx.recv().await {
        match event {
            RunEvent::Log(line) => println!("{}", line),
            RunEvent::Progress(pct) => {
                eprint!("\rProgress: {:>3}%", pct);
                let _ = std::io::stderr().flush();
            }
            RunEvent::Finished { succeeded, total } => finished = Some((succeeded, total)),
        }
    }
    eprintln!();

    run.await.context("grab task join")??;
    if let Some((succeeded, total)) = finished {
        println!("Done: {}/{}", succeeded, total);
    }
    Ok(())
}
