//! End-to-end grab runs against a local HTTP server.

mod common;

use common::image_server::{self, Route};
use picgrab_core::control::CancelToken;
use picgrab_core::downloader::{AllowList, DownloadOptions, DownloadSummary, RefererPolicy};
use picgrab_core::http::{ClientOptions, HttpClient};
use picgrab_core::retry::RetryPolicy;
use picgrab_core::scheduler::{run_grab, EventSink, GrabRequest, RunEvent};
use std::path::Path;
use tempfile::tempdir;

fn client() -> HttpClient {
    HttpClient::new(ClientOptions {
        retry: RetryPolicy::no_retry(),
        ..ClientOptions::default()
    })
}

fn options(out: &Path, allow: &str, min_bytes: u64) -> DownloadOptions {
    DownloadOptions {
        output_dir: out.to_path_buf(),
        allow_extensions: AllowList::parse(allow),
        min_bytes,
        accept_data_urls: false,
        referer: RefererPolicy::default(),
        workers: 4,
    }
}

async fn grab(pages: Vec<String>, opts: DownloadOptions) -> (DownloadSummary, Vec<RunEvent>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let summary = run_grab(
        GrabRequest { pages, options: opts },
        client(),
        CancelToken::new(),
        EventSink::new(tx),
    )
    .await
    .expect("run_grab");
    let mut events = Vec::new();
    while let Some(ev) = rx.recv().await {
        events.push(ev);
    }
    (summary, events)
}

fn logs(events: &[RunEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Log(l) => Some(l.clone()),
            _ => None,
        })
        .collect()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn largest_size_variant_is_the_only_download() {
    let big: Vec<u8> = (0u8..=255).cycle().take(8_000).collect();
    let server = image_server::start(vec![
        (
            "/a",
            Route::html(r#"<html><body><img src="pic-200x200.jpg"><img src="pic-800x800.jpg"></body></html>"#),
        ),
        ("/pic-200x200.jpg", Route::ok("image/jpeg", vec![1u8; 500])),
        ("/pic-800x800.jpg", Route::ok("image/jpeg", big.clone())),
    ]);
    let out = tempdir().unwrap();

    let (summary, events) = grab(vec![server.url("/a")], options(out.path(), "jpg", 0)).await;

    assert_eq!(summary, DownloadSummary { succeeded: 1, total: 1 });
    assert_eq!(events.last(), Some(&RunEvent::Finished { succeeded: 1, total: 1 }));
    assert!(events.contains(&RunEvent::Progress(100)));
    assert_eq!(files_in(out.path()), vec!["pic-800x800.jpg"]);
    assert_eq!(std::fs::read(out.path().join("pic-800x800.jpg")).unwrap(), big);
    assert!(!server.paths("GET").contains(&"/pic-200x200.jpg".to_string()));
    assert!(server.paths("HEAD").is_empty());
    assert!(logs(&events).iter().any(|l| l.contains("1 URLs remain")));

    let image_req = server
        .requests()
        .into_iter()
        .find(|r| r.path == "/pic-800x800.jpg")
        .unwrap();
    assert_eq!(image_req.referer, Some(format!("{}/", server.base)));
}

#[tokio::test]
async fn identical_bodies_are_saved_once() {
    let body = vec![7u8; 2_000];
    let server = image_server::start(vec![
        ("/page", Route::html(r#"<img src="/one.png"><img src="/two.png">"#)),
        ("/one.png", Route::ok("image/png", body.clone())),
        ("/two.png", Route::ok("image/png", body)),
    ]);
    let out = tempdir().unwrap();

    let (summary, events) = grab(vec![server.url("/page")], options(out.path(), "", 0)).await;

    assert_eq!(summary, DownloadSummary { succeeded: 1, total: 2 });
    assert_eq!(files_in(out.path()).len(), 1);
    let logs = logs(&events);
    assert_eq!(logs.iter().filter(|l| l.starts_with("Saved: ")).count(), 1);
    assert_eq!(logs.iter().filter(|l| l.contains("duplicate content")).count(), 1);
}

#[tokio::test]
async fn small_and_non_image_responses_are_skipped() {
    let server = image_server::start(vec![
        (
            "/page",
            Route::html(r#"<img src="/tiny.gif"><img src="/widget"><img src="/big.webp">"#),
        ),
        ("/tiny.gif", Route::ok("image/gif", vec![0u8; 40])),
        ("/widget", Route::html("<p>not an image</p>")),
        ("/big.webp", Route::ok("image/webp", vec![9u8; 4_096])),
    ]);
    let out = tempdir().unwrap();

    let (summary, events) = grab(vec![server.url("/page")], options(out.path(), "", 1_000)).await;

    assert_eq!(summary, DownloadSummary { succeeded: 1, total: 3 });
    assert_eq!(files_in(out.path()), vec!["big.webp"]);
    let logs = logs(&events);
    assert!(logs.iter().any(|l| l.contains("smaller than 1000B") && l.contains("tiny.gif")));
    assert!(logs.iter().any(|l| l.contains("not an image (text/html")));
}

#[tokio::test]
async fn content_type_decides_the_extension_and_allow_list() {
    let server = image_server::start(vec![
        ("/page", Route::html(r#"<a href="/dl/photo.jpg?x=1">full</a><img src="/img/banner.png">"#)),
        ("/dl/photo.jpg?x=1", Route::ok("image/webp", vec![3u8; 3_000])),
        ("/img/banner.png", Route::ok("image/png", vec![4u8; 3_000])),
    ]);
    let out = tempdir().unwrap();

    let (summary, _events) = grab(vec![server.url("/page")], options(out.path(), "webp", 0)).await;

    assert_eq!(summary, DownloadSummary { succeeded: 1, total: 2 });
    assert_eq!(files_in(out.path()), vec!["photo.webp"]);
}

#[tokio::test]
async fn unhinted_variants_are_chosen_by_head_probe() {
    let server = image_server::start(vec![
        ("/page", Route::html(r#"<img src="/s/cat.jpg"><img src="/l/cat.jpg">"#)),
        ("/s/cat.jpg", Route::ok("image/jpeg", vec![1u8; 1_000])),
        ("/l/cat.jpg", Route::ok("image/jpeg", vec![2u8; 6_000])),
    ]);
    let out = tempdir().unwrap();

    let (summary, _events) = grab(vec![server.url("/page")], options(out.path(), "jpg", 0)).await;

    assert_eq!(summary, DownloadSummary { succeeded: 1, total: 1 });
    let mut heads = server.paths("HEAD");
    heads.sort();
    assert_eq!(heads, vec!["/l/cat.jpg", "/s/cat.jpg"]);
    assert_eq!(server.paths("GET").iter().filter(|p| p.ends_with("cat.jpg")).count(), 1);
    assert_eq!(std::fs::read(out.path().join("cat.jpg")).unwrap(), vec![2u8; 6_000]);
}

#[tokio::test]
async fn failing_and_empty_pages_are_logged_not_fatal() {
    let server = image_server::start(vec![
        ("/empty", Route::html("<p>nothing here</p>")),
        ("/good", Route::html(r#"<img src="/x.png">"#)),
        ("/x.png", Route::ok("image/png", vec![5u8; 100])),
    ]);
    let out = tempdir().unwrap();
    let pages = vec![server.url("/missing"), server.url("/empty"), server.url("/good")];

    let (summary, events) = grab(pages, options(out.path(), "png", 0)).await;

    assert_eq!(summary, DownloadSummary { succeeded: 1, total: 1 });
    let logs = logs(&events);
    assert!(logs.iter().any(|l| l.starts_with("Failed to fetch page") && l.contains("/missing")));
    assert!(logs.iter().any(|l| l.starts_with("No images found at") && l.contains("/empty")));
}

#[tokio::test]
async fn run_without_any_images_reports_zero_of_zero() {
    let server = image_server::start(vec![("/empty", Route::html("<p>nothing</p>"))]);
    let out = tempdir().unwrap();

    let (summary, events) = grab(vec![server.url("/empty")], options(out.path(), "", 0)).await;

    assert_eq!(summary, DownloadSummary::default());
    assert_eq!(events.last(), Some(&RunEvent::Finished { succeeded: 0, total: 0 }));
}
