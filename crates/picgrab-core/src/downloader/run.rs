//! Bounded worker pool over the resolved URL list.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use super::item::download_one;
use super::options::DownloadOptions;
use super::outcome::{ItemOutcome, ItemStatus, SkipReason};
use super::save::SaveContext;
use crate::control::CancelToken;
use crate::dedup::SeenHashes;
use crate::http::HttpClient;

/// Terminal count of a download run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub total: usize,
}

/// Download every URL with at most `opts.workers` in flight.
///
/// `on_outcome` is called on the calling thread, exactly once per URL, with
/// the outcome and the integer percentage of URLs completed so far. Units that
/// never started because of cancellation are reported as skipped. Returns only
/// after every worker has exited.
pub fn download_all<F>(
    client: &HttpClient,
    urls: Vec<String>,
    opts: &DownloadOptions,
    page_referer: Option<String>,
    cancel: &CancelToken,
    mut on_outcome: F,
) -> DownloadSummary
where
    F: FnMut(&ItemOutcome, u8),
{
    let total = urls.len();
    let mut summary = DownloadSummary {
        succeeded: 0,
        total,
    };
    if total == 0 {
        return summary;
    }

    let work: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(urls.into_iter().collect()));
    let opts = Arc::new(opts.clone());
    let seen = Arc::new(SeenHashes::new());
    let page_referer = Arc::new(page_referer);
    let (tx, rx) = mpsc::channel::<ItemOutcome>();
    let num_workers = opts.workers.max(1).min(total);
    let mut handles = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let opts = Arc::clone(&opts);
        let seen = Arc::clone(&seen);
        let page_referer = Arc::clone(&page_referer);
        let cancel = cancel.clone();
        let client = client.clone();
        handles.push(std::thread::spawn(move || loop {
            if cancel.is_cancelled() {
                break;
            }
            let next = work
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front();
            let Some(url) = next else {
                break;
            };
            let ctx = SaveContext {
                output_dir: &opts.output_dir,
                allow: &opts.allow_extensions,
                min_bytes: opts.min_bytes,
                seen: &seen,
                cancel: &cancel,
            };
            let outcome = download_one(
                &client,
                &url,
                page_referer.as_deref(),
                &opts.referer,
                opts.accept_data_urls,
                &ctx,
            );
            if tx.send(outcome).is_err() {
                break;
            }
        }));
    }
    drop(tx);

    let mut done = 0usize;
    let mut report = |outcome: ItemOutcome, summary: &mut DownloadSummary| {
        done += 1;
        if outcome.success() {
            summary.succeeded += 1;
        }
        let pct = (done * 100 / total) as u8;
        on_outcome(&outcome, pct);
    };

    while let Ok(outcome) = rx.recv() {
        report(outcome, &mut summary);
    }
    for h in handles {
        if h.join().is_err() {
            tracing::warn!("download worker panicked");
        }
    }

    let leftover: Vec<String> = work
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .drain(..)
        .collect();
    if !leftover.is_empty() {
        tracing::info!(remaining = leftover.len(), "run cancelled before all downloads started");
    }
    for url in leftover {
        let outcome = ItemOutcome::new(
            url,
            ItemStatus::Skipped {
                reason: SkipReason::Cancelled,
                name: None,
            },
        );
        report(outcome, &mut summary);
    }
    summary
}
