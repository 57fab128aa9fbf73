//! One grab run: pages in, files on disk, events out.

use anyhow::{Context, Result};
use std::collections::HashSet;

use super::events::EventSink;
use crate::control::CancelToken;
use crate::downloader::{self, DownloadOptions, DownloadSummary};
use crate::extract;
use crate::http::HttpClient;
use crate::variants::{self, HintTable};

/// What the consumer asks for.
#[derive(Debug, Clone)]
pub struct GrabRequest {
    pub pages: Vec<String>,
    pub options: DownloadOptions,
}

/// Candidates of several pages merged: first-seen order, duplicates dropped,
/// hint tables combined (a later page's hint for the same URL wins).
pub fn collect_candidates(pages: Vec<extract::PageImages>) -> (Vec<String>, HintTable) {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut hints = HintTable::new();
    for page in pages {
        hints.extend(page.hints);
        for u in page.urls {
            if seen.insert(u.clone()) {
                urls.push(u);
            }
        }
    }
    (urls, hints)
}

/// Run a full grab.
///
/// Fails before doing any work when no page URL is supplied or the output
/// directory cannot be created. Everything after that is reported through
/// `events` and never aborts the run; `Finished` is always sent last.
pub async fn run_grab(
    request: GrabRequest,
    client: HttpClient,
    cancel: CancelToken,
    events: EventSink,
) -> Result<DownloadSummary> {
    let pages: Vec<String> = request
        .pages
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if pages.is_empty() {
        anyhow::bail!("no page URL supplied");
    }
    let opts = request.options;
    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("create output dir {}", opts.output_dir.display()))?;
    tracing::info!(pages = pages.len(), out = %opts.output_dir.display(), "grab run started");

    let mut found = Vec::new();
    for page in &pages {
        if cancel.is_cancelled() {
            break;
        }
        let fetched = tokio::task::spawn_blocking({
            let client = client.clone();
            let page = page.clone();
            move || {
                let html = client.get_text(&page, client.timeouts().page)?;
                Ok::<_, crate::retry::FetchError>(extract::extract(&html, &page))
            }
        })
        .await
        .context("page fetch task join")?;
        match fetched {
            Ok(images) if images.is_empty() => events.log(format!("No images found at: {}", page)),
            Ok(images) => found.push(images),
            Err(e) => {
                tracing::warn!(page = %page, "page fetch failed: {}", e);
                events.log(format!("Failed to fetch page {}: {}", page, e));
            }
        }
    }

    let (candidates, hints) = collect_candidates(found);
    if candidates.is_empty() || cancel.is_cancelled() {
        if cancel.is_cancelled() {
            events.log("Cancelled.");
        }
        events.finished(0, 0);
        return Ok(DownloadSummary::default());
    }

    let workers = opts.workers.max(1);
    let resolved = tokio::task::spawn_blocking({
        let client = client.clone();
        let cancel = cancel.clone();
        move || variants::resolve(&candidates, &hints, &client, workers, &cancel)
    })
    .await
    .context("variant resolution task join")?;
    events.log(format!(
        "After grouping variants, {} URLs remain to download.",
        resolved.len()
    ));
    tracing::info!(urls = resolved.len(), "variants resolved");

    let page_referer = opts.referer.for_page(&pages[0]);
    let summary = tokio::task::spawn_blocking({
        let events = events.clone();
        move || {
            downloader::download_all(&client, resolved, &opts, page_referer, &cancel, |outcome, pct| {
                events.log(outcome.message());
                events.progress(pct);
            })
        }
    })
    .await
    .context("download task join")?;

    tracing::info!(succeeded = summary.succeeded, total = summary.total, "grab run finished");
    events.finished(summary.succeeded, summary.total);
    Ok(summary)
}
