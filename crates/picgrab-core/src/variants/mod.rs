//! Variant resolution: reduce a candidate list to one URL per distinct image.
//!
//! Image hosts advertise thumbnails in several ways (a `-WxH` file-name
//! suffix, a `/236x/` path segment, `?w=`/`?fit=` query parameters). All of
//! them are folded into one canonical key space so the largest variant can be
//! chosen without per-site rules.

mod canonical;
mod hint;
mod select;

pub use canonical::{canonical_key, is_original_path, rewrite_pinned, ORIGINALS_SEGMENT};
pub use hint::{size_from_path, size_from_query, HintTable, SizeHint};
use crate::control::CancelToken;

pub use select::{build_buckets, choose, classify_candidate, Bucket, ContentLengthProbe, Variant};

/// Resolve `urls` to one chosen URL per bucket, in bucket encounter order.
/// Chosen URLs are the rewritten ones (pinned segments replaced by originals).
/// After `cancel` is raised buckets are still resolved, but without probing.
pub fn resolve<P: ContentLengthProbe>(
    urls: &[String],
    hints: &HintTable,
    probe: &P,
    probe_workers: usize,
    cancel: &CancelToken,
) -> Vec<String> {
    let buckets = build_buckets(urls, hints);
    tracing::debug!(candidates = urls.len(), buckets = buckets.len(), "grouped variants");
    buckets
        .iter()
        .filter_map(|b| choose(b, probe, probe_workers, cancel).map(|v| v.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoProbe;

    impl ContentLengthProbe for NoProbe {
        fn content_length(&self, _url: &str) -> Option<u64> {
            None
        }
    }

    #[test]
    fn mixed_conventions_resolve_per_image() {
        let urls: Vec<String> = [
            "http://example.test/pic-200x200.jpg",
            "http://example.test/pic-800x800.jpg",
            "https://i.host.test/236x/aa/bb/pin.jpg",
            "https://i.host.test/736x/aa/bb/pin.jpg",
            "data:image/png;base64,iVBORw0KGgo=",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let got = resolve(&urls, &HintTable::new(), &NoProbe, 4, &CancelToken::new());
        assert_eq!(
            got,
            vec![
                "http://example.test/pic-800x800.jpg",
                "https://i.host.test/originals/aa/bb/pin.jpg",
                "data:image/png;base64,iVBORw0KGgo=",
            ]
        );
    }

    #[test]
    fn empty_input_resolves_to_nothing() {
        assert!(resolve(&[], &HintTable::new(), &NoProbe, 4, &CancelToken::new()).is_empty());
    }
}
