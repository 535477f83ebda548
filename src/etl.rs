// src/etl.rs

use anyhow::{Context, Result};
use std::{fs::File, path::Path};
use tracing::{info, instrument};

use crate::{
    assemble::{load_eleicoes, Eleicoes},
    load::{
        candidates::DEFAULT_CARGO, votes_2018::ElectionsProvider, votes_2022::ResultsSource,
    },
    schema::{ElectionResult, CANONICAL_COLUMNS},
};

#[derive(Debug, Clone)]
pub struct EtlOptions {
    pub cargo: String,
    /// Where to write the per-region 2022 summaries as JSON, if anywhere.
    pub summaries_path: Option<std::path::PathBuf>,
}

impl Default for EtlOptions {
    fn default() -> Self {
        Self {
            cargo: DEFAULT_CARGO.to_string(),
            summaries_path: None,
        }
    }
}

/// Build the historical table from `input_dir` registries and write it to
/// `output_file`. The assembled data is returned as well.
#[instrument(level = "info", skip_all, fields(input = %input_dir.display(), output = %output_file.display()))]
pub async fn etl_eleicoes<P, S>(
    input_dir: &Path,
    output_file: &Path,
    provider: &P,
    source: &S,
    options: &EtlOptions,
) -> Result<Eleicoes>
where
    P: ElectionsProvider,
    S: ResultsSource,
{
    let eleicoes = load_eleicoes(input_dir, provider, source, &options.cargo).await?;
    write_csv(&eleicoes.rows, output_file)?;

    if let Some(path) = &options.summaries_path {
        write_summaries(&eleicoes, path)?;
    }

    Ok(eleicoes)
}

/// CSV with a leading unnamed 0-based row index column, then the canonical columns.
pub fn write_csv(rows: &[ElectionResult], path: &Path) -> Result<usize> {
    info!(path = %path.display(), rows = rows.len(), "Writing CSV");

    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {:?}", path))?;

    let mut header = vec![""];
    header.extend(CANONICAL_COLUMNS);
    wtr.write_record(&header)?;

    for (idx, row) in rows.iter().enumerate() {
        let idx = idx.to_string();
        let fields = row.to_record();
        wtr.write_record(std::iter::once(idx.as_str()).chain(fields.iter().map(String::as_str)))?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

/// `{uf: summary}` as pretty JSON.
pub fn write_summaries(eleicoes: &Eleicoes, path: &Path) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {:?}", path))?;
    serde_json::to_writer_pretty(f, &eleicoes.summaries)
        .with_context(|| format!("writing summaries to {:?}", path))?;
    info!(path = %path.display(), regions = eleicoes.summaries.len(), "summaries written");
    Ok(())
}
