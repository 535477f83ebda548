use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument};
use url::Url;
use zip::ZipArchive;

/// Local file name for a download: the URL's last non-empty path segment.
pub fn file_name_from_url(url_str: &str) -> Result<String> {
    let url = Url::parse(url_str).with_context(|| format!("parsing URL {}", url_str))?;
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no file name in URL {}", url_str))
}

/// Stream the body of `url_str` into `dest_dir/<file name>`, chunk by chunk.
/// Overwrites an existing file. Returns the full path of the saved file.
#[instrument(level = "info", skip(client, dest_dir), fields(url = %url_str))]
pub async fn download_file(
    client: &Client,
    url_str: &str,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let dest_path = dest_dir.join(file_name_from_url(url_str)?);

    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating {:?}", dest_dir))?;

    let resp = client
        .get(url_str)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url_str))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url_str))?;

    let mut file = fs::File::create(&dest_path)
        .await
        .with_context(|| format!("creating {:?}", dest_path))?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Failed to read chunk from response")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {:?}", dest_path))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(bytes = written, path = %dest_path.display(), "download complete");
    Ok(dest_path)
}

/// Unpack every file entry of `zip_path` under `dest_dir`. Entries whose
/// names would escape `dest_dir` are skipped.
#[instrument(level = "info", skip(zip_path, dest_dir), fields(path = %zip_path.as_ref().display()))]
pub fn extract_zip<P: AsRef<Path>, Q: AsRef<Path>>(zip_path: P, dest_dir: Q) -> Result<Vec<PathBuf>> {
    let zip_path = zip_path.as_ref();
    let dest_dir = dest_dir.as_ref();

    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;

    std::fs::create_dir_all(dest_dir).with_context(|| format!("creating {:?}", dest_dir))?;

    let mut extracted = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to access ZIP entry #{} in {:?}", i, zip_path))?;
        if !entry.is_file() {
            continue;
        }
        let Some(rel) = entry.enclosed_name() else {
            debug!(name = entry.name(), "skipping unsafe entry name");
            continue;
        };

        let out_path = dest_dir.join(rel);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("creating {:?}", out_path))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("extracting {} from {:?}", entry.name(), zip_path))?;
        extracted.push(out_path);
    }

    debug!(count = extracted.len(), dest = %dest_dir.display(), "extracted");
    Ok(extracted)
}
