//! Bucketing of candidates and choice of the best member per bucket.

use std::collections::HashMap;
use url::Url;

use super::canonical::{canonical_key, is_original_path, rewrite_pinned};
use super::hint::{size_from_path, size_from_query, HintTable, SizeHint};
use crate::checksum::sha256_bytes;
use crate::control::CancelToken;
use crate::http::HttpClient;
use crate::url_model::is_data_url;

/// Network fallback used when no member of a bucket carries a size hint.
pub trait ContentLengthProbe: Sync {
    /// Reported `Content-Length`, or `None` when the probe fails.
    fn content_length(&self, url: &str) -> Option<u64>;
}

impl ContentLengthProbe for HttpClient {
    fn content_length(&self, url: &str) -> Option<u64> {
        self.head_content_length(url)
    }
}

/// One candidate after rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// URL with pinned segments rewritten; this is what gets downloaded.
    pub url: String,
    /// Rewritten path; `None` for data URLs.
    pub path: Option<String>,
    pub hint: Option<SizeHint>,
}

/// All variants sharing one canonical key, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub members: Vec<Variant>,
}

/// Rewrite one remote candidate and compute its key and hint.
/// Hint priority: path (suffix or pinned dir), query, extractor table.
pub fn classify_candidate(url: &str, hints: &HintTable) -> (String, Variant) {
    if is_data_url(url) {
        let key = format!("data:{}", sha256_bytes(url.as_bytes()));
        return (
            key,
            Variant {
                url: url.to_string(),
                path: None,
                hint: None,
            },
        );
    }

    let parsed = Url::parse(url).ok();
    let (rewritten_url, rewritten_path) = match parsed {
        Some(mut u) => {
            let rewritten = rewrite_pinned(u.path());
            if rewritten != u.path() {
                u.set_path(&rewritten);
                (u.to_string(), rewritten)
            } else {
                (url.to_string(), rewritten)
            }
        }
        None => {
            let rewritten = rewrite_pinned(url);
            (rewritten.clone(), rewritten)
        }
    };

    let hint = size_from_path(&rewritten_path)
        .or_else(|| Url::parse(&rewritten_url).ok().and_then(|u| size_from_query(&u)))
        .or_else(|| hints.get(&rewritten_url).copied());
    let key = canonical_key(&rewritten_path);
    (
        key,
        Variant {
            url: rewritten_url,
            path: Some(rewritten_path),
            hint,
        },
    )
}

/// Group candidates by canonical key. Buckets come out in the order their
/// first member was seen.
pub fn build_buckets(urls: &[String], hints: &HintTable) -> Vec<Bucket> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();
    for url in urls {
        let (key, variant) = classify_candidate(url, hints);
        match index.get(&key) {
            Some(&i) => buckets[i].members.push(variant),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    key,
                    members: vec![variant],
                });
            }
        }
    }
    buckets
}

/// Pick the best member of a bucket.
///
/// Originals outrank everything else. Within the pool the largest hinted area
/// wins (first on ties). With no hints at all, members are probed in parallel
/// (at most `probe_workers` at a time) and the largest `Content-Length` wins;
/// if every probe fails the first member is used. Once `cancel` is raised no
/// further probe is sent and the remaining ones count as failed.
pub fn choose<'a, P: ContentLengthProbe>(
    bucket: &'a Bucket,
    probe: &P,
    probe_workers: usize,
    cancel: &CancelToken,
) -> Option<&'a Variant> {
    let originals: Vec<&Variant> = bucket
        .members
        .iter()
        .filter(|v| v.path.as_deref().map(is_original_path).unwrap_or(false))
        .collect();
    let pool: Vec<&Variant> = if originals.is_empty() {
        bucket.members.iter().collect()
    } else {
        originals
    };
    let first = *pool.first()?;
    if pool.len() == 1 {
        return Some(first);
    }

    let mut best_hinted: Option<(&Variant, u64)> = None;
    for v in pool.iter().copied() {
        if let Some(h) = v.hint {
            if best_hinted.map(|(_, a)| h.area() > a).unwrap_or(true) {
                best_hinted = Some((v, h.area()));
            }
        }
    }
    if let Some((v, _)) = best_hinted {
        return Some(v);
    }

    let lengths = probe_all(&pool, probe, probe_workers, cancel);
    let mut best: Option<(&Variant, u64)> = None;
    for (v, len) in pool.iter().copied().zip(lengths) {
        if let Some(len) = len {
            if best.map(|(_, b)| len > b).unwrap_or(true) {
                best = Some((v, len));
            }
        }
    }
    tracing::debug!(
        key = %bucket.key,
        probed = pool.len(),
        found = best.is_some(),
        "no size hints; chose by content length"
    );
    Some(best.map(|(v, _)| v).unwrap_or(first))
}

fn probe_one<P: ContentLengthProbe>(probe: &P, url: &str, cancel: &CancelToken) -> Option<u64> {
    cancel.check().ok()?;
    probe.content_length(url)
}

/// Content lengths for every member, in pool order.
fn probe_all<P: ContentLengthProbe>(
    pool: &[&Variant],
    probe: &P,
    probe_workers: usize,
    cancel: &CancelToken,
) -> Vec<Option<u64>> {
    let width = probe_workers.max(1);
    let mut out = Vec::with_capacity(pool.len());
    for chunk in pool.chunks(width) {
        if cancel.is_cancelled() {
            out.resize(pool.len(), None);
            break;
        }
        if chunk.len() == 1 {
            out.push(probe_one(probe, &chunk[0].url, cancel));
            continue;
        }
        let results: Vec<Option<u64>> = std::thread::scope(|s| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|v| s.spawn(move || probe_one(probe, &v.url, cancel)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(None))
                .collect()
        });
        out.extend(results);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Probe answering from a fixed table and recording what it was asked.
    #[derive(Default)]
    struct TableProbe {
        lengths: HashMap<String, u64>,
        asked: Mutex<Vec<String>>,
    }

    impl TableProbe {
        fn with(entries: &[(&str, u64)]) -> Self {
            Self {
                lengths: entries.iter().map(|(u, l)| (u.to_string(), *l)).collect(),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<String> {
            let mut v = self.asked.lock().unwrap().clone();
            v.sort();
            v
        }
    }

    impl ContentLengthProbe for TableProbe {
        fn content_length(&self, url: &str) -> Option<u64> {
            self.asked.lock().unwrap().push(url.to_string());
            self.lengths.get(url).copied()
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pick(list: &[&str], hints: &HintTable, probe: &TableProbe) -> Vec<String> {
        build_buckets(&urls(list), hints)
            .iter()
            .filter_map(|b| choose(b, probe, 4, &CancelToken::new()).map(|v| v.url.clone()))
            .collect()
    }

    #[test]
    fn largest_suffix_wins() {
        let probe = TableProbe::default();
        let got = pick(
            &[
                "https://cdn.test/u/img-100x100.jpg",
                "https://cdn.test/u/img-800x600.jpg",
                "https://cdn.test/u/img-300x300.jpg",
            ],
            &HintTable::new(),
            &probe,
        );
        assert_eq!(got, vec!["https://cdn.test/u/img-800x600.jpg"]);
        assert!(probe.asked().is_empty());
    }

    #[test]
    fn equal_area_keeps_first_seen() {
        let probe = TableProbe::default();
        let got = pick(
            &["https://a.test/p-200x100.jpg", "https://a.test/p-100x200.jpg"],
            &HintTable::new(),
            &probe,
        );
        assert_eq!(got, vec!["https://a.test/p-200x100.jpg"]);
    }

    #[test]
    fn original_outranks_larger_sized_variant() {
        let probe = TableProbe::with(&[
            ("https://i.test/originals/ab/pin.jpg", 10),
            ("https://i.test/x/pin-2000x2000.jpg", 9_000_000),
        ]);
        let got = pick(
            &["https://i.test/x/pin-2000x2000.jpg", "https://i.test/236x/ab/pin.jpg"],
            &HintTable::new(),
            &probe,
        );
        assert_eq!(got, vec!["https://i.test/originals/ab/pin.jpg"]);
    }

    #[test]
    fn query_hints_are_used() {
        let probe = TableProbe::default();
        let got = pick(
            &["https://a.test/cat.jpg?w=300", "https://b.test/cat.jpg?fit=1200,900"],
            &HintTable::new(),
            &probe,
        );
        assert_eq!(got, vec!["https://b.test/cat.jpg?fit=1200,900"]);
    }

    #[test]
    fn extractor_hints_are_the_last_resort() {
        let mut hints = HintTable::new();
        hints.insert("https://a.test/s/dog.png".into(), SizeHint::square(400));
        hints.insert("https://a.test/l/dog.png".into(), SizeHint::square(1600));
        let probe = TableProbe::default();
        let got = pick(&["https://a.test/s/dog.png", "https://a.test/l/dog.png"], &hints, &probe);
        assert_eq!(got, vec!["https://a.test/l/dog.png"]);
    }

    #[test]
    fn unhinted_buckets_are_probed() {
        let probe = TableProbe::with(&[
            ("https://a.test/1/x.jpg", 100),
            ("https://a.test/2/x.jpg", 5_000),
            ("https://a.test/3/x.jpg", 4_000),
        ]);
        let got = pick(
            &["https://a.test/1/x.jpg", "https://a.test/2/x.jpg", "https://a.test/3/x.jpg"],
            &HintTable::new(),
            &probe,
        );
        assert_eq!(got, vec!["https://a.test/2/x.jpg"]);
        assert_eq!(probe.asked().len(), 3);
    }

    #[test]
    fn all_probes_failing_falls_back_to_first() {
        let probe = TableProbe::default();
        let got = pick(&["https://a.test/1/y.jpg", "https://a.test/2/y.jpg"], &HintTable::new(), &probe);
        assert_eq!(got, vec!["https://a.test/1/y.jpg"]);
    }

    #[test]
    fn single_member_is_not_probed() {
        let probe = TableProbe::default();
        let got = pick(&["https://a.test/solo.jpg"], &HintTable::new(), &probe);
        assert_eq!(got, vec!["https://a.test/solo.jpg"]);
        assert!(probe.asked().is_empty());
    }

    #[test]
    fn data_urls_never_merge() {
        let a = "data:image/png;base64,AAAA";
        let b = "data:image/png;base64,BBBB";
        let buckets = build_buckets(&urls(&[a, b, "https://a.test/img.png"]), &HintTable::new());
        assert_eq!(buckets.len(), 3);
        assert!(buckets[0].key.starts_with("data:"));
        assert_ne!(buckets[0].key, buckets[1].key);
        assert_eq!(buckets[0].members[0].url, a);
    }

    #[test]
    fn every_bucket_yields_exactly_one_url() {
        let list = [
            "https://a.test/p/one-10x10.jpg",
            "https://a.test/p/one-20x20.jpg",
            "https://a.test/p/two.png",
            "https://a.test/q/two.png",
            "data:image/gif;base64,R0lGOD==",
        ];
        let probe = TableProbe::default();
        let buckets = build_buckets(&urls(&list), &HintTable::new());
        assert_eq!(buckets.len(), 3);
        for b in &buckets {
            assert!(choose(b, &probe, 2, &CancelToken::new()).is_some());
        }
    }

    /// Answers every probe and raises the cancel signal on its first call.
    struct CancellingProbe {
        cancel: CancelToken,
        calls: Mutex<usize>,
    }

    impl ContentLengthProbe for CancellingProbe {
        fn content_length(&self, _url: &str) -> Option<u64> {
            *self.calls.lock().unwrap() += 1;
            self.cancel.cancel();
            Some(1_000)
        }
    }

    #[test]
    fn cancel_stops_further_probes() {
        let cancel = CancelToken::new();
        let probe = CancellingProbe {
            cancel: cancel.clone(),
            calls: Mutex::new(0),
        };
        let buckets = build_buckets(
            &urls(&[
                "https://a.test/1/x.jpg",
                "https://a.test/2/x.jpg",
                "https://a.test/3/x.jpg",
                "https://b.test/1/y.jpg",
                "https://b.test/2/y.jpg",
            ]),
            &HintTable::new(),
        );
        assert_eq!(buckets.len(), 2);
        let got: Vec<&str> = buckets
            .iter()
            .filter_map(|b| choose(b, &probe, 1, &cancel).map(|v| v.url.as_str()))
            .collect();
        assert_eq!(*probe.calls.lock().unwrap(), 1);
        assert_eq!(got, vec!["https://a.test/1/x.jpg", "https://b.test/1/y.jpg"]);
    }

    #[test]
    fn cancelled_before_resolution_sends_no_probe() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let probe = TableProbe::with(&[("https://a.test/2/z.jpg", 9)]);
        let buckets = build_buckets(
            &urls(&["https://a.test/1/z.jpg", "https://a.test/2/z.jpg"]),
            &HintTable::new(),
        );
        let chosen = choose(&buckets[0], &probe, 4, &cancel).map(|v| v.url.clone());
        assert_eq!(chosen.as_deref(), Some("https://a.test/1/z.jpg"));
        assert!(probe.asked().is_empty());
    }
}
