//! Request kinds issued by the crate: page text, HEAD probe, image GET, file download.

use std::cell::{Cell, RefCell};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

use super::headers::{parse_headers, parse_status_line};
use super::HttpClient;
use crate::retry::{run_with_retry, FetchError};

/// Body and content type of a fetched image.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}

fn header_list(headers: &[(&str, &str)]) -> Result<Option<curl::easy::List>, curl::Error> {
    if headers.is_empty() {
        return Ok(None);
    }
    let mut list = curl::easy::List::new();
    for (k, v) in headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    Ok(Some(list))
}

impl HttpClient {
    /// GET a page (or manifest) as text. A leading UTF-8 BOM is stripped.
    pub fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let bytes = run_with_retry(&self.opts.retry, || self.get_bytes_once(url, timeout))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    fn get_bytes_once(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        let mut easy = self.easy(url, timeout)?;
        // Empty string = every encoding libcurl was built with.
        easy.accept_encoding("")?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        if !is_success(code) {
            return Err(FetchError::Http(code));
        }
        Ok(body)
    }

    /// HEAD request returning `Content-Length`. Any failure (network, status,
    /// missing header) is `None`; callers treat that as lowest priority.
    pub fn head_content_length(&self, url: &str) -> Option<u64> {
        match run_with_retry(&self.opts.retry, || self.head_once(url)) {
            Ok(len) => len,
            Err(e) => {
                tracing::debug!(url, "HEAD probe failed: {}", e);
                None
            }
        }
    }

    fn head_once(&self, url: &str) -> Result<Option<u64>, FetchError> {
        let mut lines: Vec<String> = Vec::new();
        let mut easy = self.easy(url, self.opts.timeouts.head)?;
        easy.nobody(true)?;
        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        if !is_success(code) {
            return Err(FetchError::Http(code));
        }
        Ok(parse_headers(&lines).content_length)
    }

    /// Streamed GET of an image. `accept` sees the response content type before
    /// the first body chunk is stored; returning `Err(reason)` aborts the
    /// transfer with [`FetchError::Rejected`].
    pub fn get_image<A>(
        &self,
        url: &str,
        referer: Option<&str>,
        accept: A,
    ) -> Result<ImageResponse, FetchError>
    where
        A: Fn(Option<&str>) -> Result<(), String>,
    {
        run_with_retry(&self.opts.retry, || self.get_image_once(url, referer, &accept))
    }

    fn get_image_once<A>(
        &self,
        url: &str,
        referer: Option<&str>,
        accept: &A,
    ) -> Result<ImageResponse, FetchError>
    where
        A: Fn(Option<&str>) -> Result<(), String>,
    {
        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let status: Cell<Option<u32>> = Cell::new(None);
        let checked = Cell::new(false);
        let rejected: RefCell<Option<String>> = RefCell::new(None);
        let mut body: Vec<u8> = Vec::new();

        let mut easy = self.easy(url, self.opts.timeouts.image)?;
        let extra: Vec<(&str, &str)> = referer.map(|r| vec![("Referer", r)]).unwrap_or_default();
        if let Some(list) = header_list(&extra)? {
            easy.http_headers(list)?;
        }

        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    if let Some(code) = parse_status_line(line) {
                        status.set(Some(code));
                        checked.set(false);
                    }
                    lines.borrow_mut().push(line.to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                // Error bodies are drained and discarded; the status decides.
                if !status.get().map(is_success).unwrap_or(false) {
                    return Ok(data.len());
                }
                if !checked.get() {
                    checked.set(true);
                    let headers = parse_headers(&lines.borrow());
                    if let Err(reason) = accept(headers.content_type.as_deref()) {
                        rejected.borrow_mut().replace(reason);
                        return Ok(0);
                    }
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };

        if let Some(reason) = rejected.borrow_mut().take() {
            return Err(FetchError::Rejected(reason));
        }
        perform_result?;

        let code = easy.response_code()?;
        if !is_success(code) {
            return Err(FetchError::Http(code));
        }

        let headers = parse_headers(&lines.borrow());
        if !checked.get() {
            // Empty body: the content type still has to pass.
            accept(headers.content_type.as_deref()).map_err(FetchError::Rejected)?;
        }
        Ok(ImageResponse {
            body,
            content_type: headers.content_type,
        })
    }

    /// Stream `url` into `dest` (created or truncated). `on_percent` is called
    /// with each new integer percentage, only when the total size is known.
    pub fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
        on_percent: &mut dyn FnMut(u8),
    ) -> Result<u64, FetchError> {
        run_with_retry(&self.opts.retry, || {
            self.download_to_file_once(url, dest, timeout, &mut *on_percent)
        })
    }

    fn download_to_file_once(
        &self,
        url: &str,
        dest: &Path,
        timeout: Duration,
        on_percent: &mut dyn FnMut(u8),
    ) -> Result<u64, FetchError> {
        let file = File::create(dest).map_err(FetchError::Storage)?;
        let file = RefCell::new(file);
        let written = Cell::new(0u64);
        let storage_error: RefCell<Option<std::io::Error>> = RefCell::new(None);
        let last_percent: Cell<Option<u8>> = Cell::new(None);

        let mut easy = self.easy(url, timeout)?;
        easy.progress(true)?;
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match file.borrow_mut().write_all(data) {
                Ok(()) => {
                    written.set(written.get() + data.len() as u64);
                    Ok(data.len())
                }
                Err(e) => {
                    storage_error.borrow_mut().replace(e);
                    Ok(0)
                }
            })?;
            transfer.progress_function(|dltotal, dlnow, _, _| {
                if dltotal > 0.0 {
                    let pct = ((dlnow / dltotal) * 100.0).clamp(0.0, 100.0) as u8;
                    if last_percent.get() != Some(pct) {
                        last_percent.set(Some(pct));
                        on_percent(pct);
                    }
                }
                true
            })?;
            transfer.perform()
        };

        if let Err(e) = perform_result {
            if e.is_write_error() {
                if let Some(io_err) = storage_error.borrow_mut().take() {
                    return Err(FetchError::Storage(io_err));
                }
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        if !is_success(code) {
            return Err(FetchError::Http(code));
        }
        file.borrow_mut().flush().map_err(FetchError::Storage)?;
        Ok(written.get())
    }
}
