//! Tests for the grab subcommand and its option merging.

use super::parse;
use crate::cli::commands::{build_options, read_page_list};
use crate::cli::{Cli, CliCommand, GrabArgs};
use clap::Parser;
use picgrab_core::config::GrabConfig;
use std::path::PathBuf;

fn grab_args(args: &[&str]) -> GrabArgs {
    match parse(args) {
        CliCommand::Grab(a) => a,
        other => panic!("expected Grab, got {:?}", other),
    }
}

#[test]
fn cli_parse_grab_urls_only() {
    let a = grab_args(&["picgrab", "grab", "https://a.test/1", "https://a.test/2"]);
    assert_eq!(a.urls, vec!["https://a.test/1", "https://a.test/2"]);
    assert_eq!(
        a,
        GrabArgs {
            urls: a.urls.clone(),
            ..GrabArgs::default()
        }
    );
}

#[test]
fn cli_parse_grab_all_flags() {
    let a = grab_args(&[
        "picgrab",
        "grab",
        "--list",
        "pages.txt",
        "--out",
        "/tmp/pics",
        "--allow",
        "jpg,png",
        "--min-bytes",
        "0",
        "--accept-data-urls",
        "--no-auto-referer",
        "--referer",
        "https://ref.test/",
        "--workers",
        "3",
    ]);
    assert!(a.urls.is_empty());
    assert_eq!(a.list, Some(PathBuf::from("pages.txt")));
    assert_eq!(a.out, Some(PathBuf::from("/tmp/pics")));
    assert_eq!(a.allow.as_deref(), Some("jpg,png"));
    assert_eq!(a.min_bytes, Some(0));
    assert!(a.accept_data_urls);
    assert!(a.no_auto_referer);
    assert_eq!(a.referer.as_deref(), Some("https://ref.test/"));
    assert_eq!(a.workers, Some(3));
}

#[test]
fn cli_parse_grab_rejects_bad_number() {
    assert!(Cli::try_parse_from(["picgrab", "grab", "--min-bytes", "lots"]).is_err());
}

#[test]
fn overrides_apply_on_top_of_config() {
    let a = grab_args(&[
        "picgrab", "grab", "u", "--out", "shots", "--allow", "", "--min-bytes", "0",
        "--no-auto-referer", "--workers", "500",
    ]);
    let o = build_options(&GrabConfig::default(), &a);
    assert_eq!(o.output_dir, PathBuf::from("shots"));
    assert!(o.allow_extensions.is_empty());
    assert_eq!(o.min_bytes, 0);
    assert!(!o.referer.auto_from_page);
    assert_eq!(o.workers, 32);
    assert!(!o.accept_data_urls);
}

#[test]
fn no_overrides_keep_config_values() {
    let o = build_options(&GrabConfig::default(), &GrabArgs::default());
    assert_eq!(o.output_dir, PathBuf::from("images"));
    assert_eq!(o.min_bytes, 30_000);
    assert_eq!(o.workers, 8);
    assert!(o.referer.auto_from_page);
}

#[test]
fn page_list_skips_blanks_and_comments() {
    let text = "https://a.test/1\n\n   \n# later\n  https://a.test/2  \r\n";
    assert_eq!(read_page_list(text), vec!["https://a.test/1", "https://a.test/2"]);
}
