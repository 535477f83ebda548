// src/fetch/registries.rs

use anyhow::Result;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::info;

use super::zips::{download_file, extract_zip};
use crate::config::registry_zip_url;

/// Download `consulta_cand_{year}.zip` for each year into `dest_dir` and
/// unpack it into `dest_dir/consulta_cand_{year}/`, the layout the
/// candidate loader reads. Years are handled one after another.
pub async fn download_registries(
    client: &Client,
    years: &[u16],
    dest_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let dest_dir = dest_dir.as_ref();
    let mut out = Vec::with_capacity(years.len());

    for &year in years {
        let url = registry_zip_url(year);
        info!(year, url = %url, "downloading candidate registry");
        let zip_path = download_file(client, &url, dest_dir).await?;

        let target = dest_dir.join(format!("consulta_cand_{}", year));
        let files = tokio::task::spawn_blocking({
            let target = target.clone();
            move || extract_zip(&zip_path, &target)
        })
        .await??;
        info!(year, files = files.len(), dir = %target.display(), "registry extracted");

        out.push(target);
    }

    Ok(out)
}
