use crate::error::FetchError;
use crate::events::{EventSink, UiEvent};
use crate::http::HttpResponse;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Download a file from `url` to `dest` with progress reported through `sink`.
/// Skips download if `dest` already exists and is non-empty.
pub fn download(
    agent: &ureq::Agent,
    url: &str,
    dest: &Path,
    sink: &dyn EventSink,
) -> Result<u64, FetchError> {
    if let Ok(meta) = fs::metadata(dest) {
        if meta.len() > 0 {
            sink.send(UiEvent::Log(format!("Already downloaded: {}", dest.display())));
            return Ok(meta.len());
        }
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| io_failure("create download directory", e))?;
    }

    let transport_err = |e: ureq::Error| FetchError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    };

    let resp = agent.get(url).call().map_err(transport_err)?;
    let status = resp.status().as_u16();
    if !(200..300).contains(&status) {
        // Reuse the shared classification; the error body is not needed here.
        HttpResponse { status, body: Vec::new() }.into_success()?;
    }

    let total_size: u64 = resp
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    sink.send(UiEvent::DownloadStarted { total_bytes: total_size });

    let tmp_dest = dest.with_extension("part");
    let mut file = fs::File::create(&tmp_dest).map_err(|e| io_failure("create temp file", e))?;
    let mut reader = resp.into_body().into_reader();
    let mut buffer = [0u8; 64 * 1024];
    let mut downloaded = 0u64;
    let mut last_report = 0u64;

    loop {
        let n = reader.read(&mut buffer).map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: format!("network read error: {}", e),
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n]).map_err(|e| io_failure("write image", e))?;
        downloaded += n as u64;

        if downloaded - last_report > 256 * 1024 {
            sink.send(UiEvent::DownloadProgress { bytes_read: downloaded });
            last_report = downloaded;
        }
    }

    file.flush().map_err(|e| io_failure("flush image", e))?;
    drop(file);
    fs::rename(&tmp_dest, dest).map_err(|e| io_failure("rename temp file", e))?;
    log::debug!("downloaded {} bytes from {}", downloaded, url);

    sink.send(UiEvent::DownloadComplete { size_bytes: downloaded, path: dest.to_path_buf() });
    Ok(downloaded)
}

fn io_failure(what: &str, e: std::io::Error) -> FetchError {
    FetchError::Unexpected(format!("failed to {}: {}", what, e))
}
