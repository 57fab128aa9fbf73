//! One unit of download work: a remote URL or an inline data URL.

use super::options::RefererPolicy;
use super::outcome::{ItemOutcome, ItemStatus, SkipReason};
use super::save::{save_bytes, SaveContext};
use crate::checksum::sha256_bytes;
use crate::http::HttpClient;
use crate::retry::FetchError;
use crate::url_model::{
    decode_data_url, derive_filename, filename_from_url_path, has_image_extension,
    is_data_url, is_image_content_type, sanitize_filename,
};

/// Fetch (or decode) `url` and push the body through the save pipeline.
pub fn download_one(
    client: &HttpClient,
    url: &str,
    page_referer: Option<&str>,
    referer_policy: &RefererPolicy,
    accept_data_urls: bool,
    ctx: &SaveContext<'_>,
) -> ItemOutcome {
    if ctx.cancel.is_cancelled() {
        return ItemOutcome::new(
            url,
            ItemStatus::Skipped {
                reason: SkipReason::Cancelled,
                name: None,
            },
        );
    }
    let status = if is_data_url(url) {
        save_data_url(url, accept_data_urls, ctx)
    } else {
        let referer = referer_policy.for_image(page_referer, url);
        save_remote(client, url, referer.as_deref(), ctx)
    };
    ItemOutcome::new(url, status)
}

fn save_data_url(url: &str, accept: bool, ctx: &SaveContext<'_>) -> ItemStatus {
    if !accept {
        return ItemStatus::Skipped {
            reason: SkipReason::DataUrlsDisabled,
            name: None,
        };
    }
    match decode_data_url(url) {
        Ok((bytes, ext)) => {
            let digest = sha256_bytes(&bytes);
            let name = format!("inline_{}{}", &digest[..12], ext);
            save_bytes(ctx, &bytes, &name)
        }
        Err(e) => ItemStatus::Failed(format!("data URL: {}", e)),
    }
}

fn save_remote(
    client: &HttpClient,
    url: &str,
    referer: Option<&str>,
    ctx: &SaveContext<'_>,
) -> ItemStatus {
    let raw_name = sanitize_filename(&filename_from_url_path(url).unwrap_or_default());
    let looks_like_image = has_image_extension(&raw_name);
    let accept = |content_type: Option<&str>| -> Result<(), String> {
        if looks_like_image || content_type.map(is_image_content_type).unwrap_or(false) {
            Ok(())
        } else {
            Err(content_type.unwrap_or_default().to_string())
        }
    };

    match client.get_image(url, referer, accept) {
        Ok(resp) => {
            let name = derive_filename(url, resp.content_type.as_deref());
            save_bytes(ctx, &resp.body, &name)
        }
        Err(FetchError::Rejected(content_type)) => ItemStatus::Skipped {
            reason: SkipReason::NotAnImage {
                content_type: Some(content_type).filter(|c| !c.is_empty()),
            },
            name: None,
        },
        Err(e) => {
            tracing::warn!(url, "image download failed: {}", e);
            ItemStatus::Failed(e.to_string())
        }
    }
}
