// src/load/votes_2018.rs

use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::{
    collections::BTreeMap,
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};
use zip::ZipArchive;

use super::read_tse_csv_where;
use crate::{
    config::munzona_zip_url,
    fetch::download_file,
    schema::{
        coerce::{clean_str, parse_int},
        ColumnMap, ElectionResult, RawTable,
    },
};

pub const YEAR: u16 = 2018;

/// Provider columns → canonical columns.
pub const RENAME_VOTACAO_18: &ColumnMap = &[
    ("ano_eleicao", "ano_eleicao"),
    ("nr_turno", "nr_turno"),
    ("nr_candidato", "nr_candidato"),
    ("nm_urna_candidato", "nm_urna_candidato"),
    ("sg_uf", "uf"),
    ("qt_votos_nominais", "votos"),
];

/// Source of vote records for one office, at state level or finer.
/// Column labels are provider-defined.
#[allow(async_fn_in_trait)]
pub trait ElectionsProvider {
    async fn votes_by_state(&self, year: u16, cargo: &str) -> Result<RawTable>;
}

/// Reads the TSE `votacao_candidato_munzona` bulk ZIP: one CSV per state,
/// one row per (municipality, zone, candidate, round).
pub struct TseBulkProvider {
    client: Client,
    work_dir: PathBuf,
}

impl TseBulkProvider {
    /// `work_dir` receives the downloaded ZIP.
    pub fn new(client: Client, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            work_dir: work_dir.into(),
        }
    }
}

impl ElectionsProvider for TseBulkProvider {
    async fn votes_by_state(&self, year: u16, cargo: &str) -> Result<RawTable> {
        let zip_path = download_file(&self.client, &munzona_zip_url(year), &self.work_dir).await?;
        let cargo = cargo.to_string();
        tokio::task::spawn_blocking(move || read_munzona_zip(&zip_path, &cargo)).await?
    }
}

/// Concatenate the per-state CSV entries of a munzona ZIP, keeping rows for
/// `cargo` (case-insensitive). The `_BR` entry repeats the states and is skipped.
#[instrument(level = "info", skip(zip_path), fields(path = %zip_path.display()))]
pub fn read_munzona_zip(zip_path: &Path, cargo: &str) -> Result<RawTable> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open ZIP file: {:?}", zip_path))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {:?}", zip_path))?;

    let mut merged: Option<RawTable> = None;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to access ZIP entry #{} in {:?}", i, zip_path))?;
        let name = entry.name().to_string();
        let lower = name.to_lowercase();
        if !entry.is_file() || !lower.ends_with(".csv") || lower.ends_with("_br.csv") {
            continue;
        }

        let mut table = read_tse_csv_where(&mut entry, &name, "ds_cargo", |v| {
            v.eq_ignore_ascii_case(cargo)
        })?;
        debug!(entry = %name, rows = table.len(), "state file read");

        if let Some(acc) = merged.as_mut() {
            if acc.headers != table.headers {
                bail!("{} has a different header layout than earlier entries", name);
            }
            acc.rows.append(&mut table.rows);
        } else {
            merged = Some(table);
        }
    }

    merged.with_context(|| format!("no state CSV entries in {:?}", zip_path))
}

/// 2018 results for `cargo` in the canonical schema, one row per
/// (year, round, candidate, state).
pub async fn load_eleicoes_2018<P: ElectionsProvider>(
    provider: &P,
    cargo: &str,
) -> Result<Vec<ElectionResult>> {
    let mut raw = provider.votes_by_state(YEAR, cargo).await?;
    raw.lowercase_headers();
    let votos = raw.project(RENAME_VOTACAO_18)?;

    let out = aggregate_votes(&votos)?;
    info!(input_rows = votos.len(), rows = out.len(), "2018 votes aggregated");
    Ok(out)
}

type GroupKey = (i64, i64, i64, String, String);

/// Sum `votos` per (ano_eleicao, nr_turno, nr_candidato, nm_urna_candidato, uf)
/// and attach each group's share of its (nr_turno, uf) total. Output is in
/// key order.
pub fn aggregate_votes(votos: &RawTable) -> Result<Vec<ElectionResult>> {
    let ano = votos.require_column("ano_eleicao")?;
    let turno = votos.require_column("nr_turno")?;
    let nr = votos.require_column("nr_candidato")?;
    let nm = votos.require_column("nm_urna_candidato")?;
    let uf = votos.require_column("uf")?;
    let qt = votos.require_column("votos")?;

    let mut sums: BTreeMap<GroupKey, i64> = BTreeMap::new();
    for row in 0..votos.len() {
        let key = (
            parse_int(votos.cell(row, ano)).context("ano_eleicao")?,
            parse_int(votos.cell(row, turno)).context("nr_turno")?,
            parse_int(votos.cell(row, nr)).context("nr_candidato")?,
            clean_str(votos.cell(row, nm)).to_string(),
            clean_str(votos.cell(row, uf)).to_string(),
        );
        let v = parse_int(votos.cell(row, qt)).context("votos")?;
        *sums.entry(key).or_insert(0) += v;
    }

    let mut totals: BTreeMap<(i64, &str), i64> = BTreeMap::new();
    for ((_, turno, _, _, uf), v) in &sums {
        *totals.entry((*turno, uf.as_str())).or_insert(0) += v;
    }

    Ok(sums
        .iter()
        .map(|((ano, turno, nr, nm, uf), &votos)| {
            let total = totals.get(&(*turno, uf.as_str())).copied().unwrap_or(0);
            ElectionResult {
                ano_eleicao: *ano,
                nr_turno: *turno,
                nr_candidato: *nr,
                nm_urna_candidato: nm.clone(),
                uf: uf.clone(),
                votos,
                perc_votos: if total > 0 {
                    100.0 * votos as f64 / total as f64
                } else {
                    0.0
                },
            }
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    /// Provider returning a fixed table, in TSE munzona layout.
    pub(crate) struct FixedProvider(pub RawTable);

    impl ElectionsProvider for FixedProvider {
        async fn votes_by_state(&self, _year: u16, _cargo: &str) -> Result<RawTable> {
            Ok(self.0.clone())
        }
    }

    /// Municipality-level rows: (turno, nr, nome, uf, votos).
    pub(crate) fn munzona(rows: &[(i64, i64, &str, &str, i64)]) -> RawTable {
        let headers = [
            "ANO_ELEICAO",
            "NR_TURNO",
            "DS_CARGO",
            "NR_CANDIDATO",
            "NM_URNA_CANDIDATO",
            "SG_UF",
            "NM_MUNICIPIO",
            "QT_VOTOS_NOMINAIS",
        ];
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, (turno, nr, nm, uf, v))| {
                    vec![
                        "2018".to_string(),
                        turno.to_string(),
                        "Presidente".to_string(),
                        nr.to_string(),
                        nm.to_string(),
                        uf.to_string(),
                        format!("MUNICIPIO {}", i),
                        v.to_string(),
                    ]
                })
                .collect(),
        }
    }

    fn sample() -> RawTable {
        munzona(&[
            (1, 17, "JAIR BOLSONARO", "SP", 600),
            (1, 17, "JAIR BOLSONARO", "SP", 400),
            (1, 13, "FERNANDO HADDAD", "SP", 500),
            (1, 12, "CIRO GOMES", "SP", 100),
            (1, 17, "JAIR BOLSONARO", "BA", 300),
            (1, 13, "FERNANDO HADDAD", "BA", 700),
            (2, 17, "JAIR BOLSONARO", "SP", 1200),
            (2, 13, "FERNANDO HADDAD", "SP", 800),
        ])
    }

    #[tokio::test]
    async fn test_reaggregates_municipal_rows() {
        let out = load_eleicoes_2018(&FixedProvider(sample()), "PRESIDENTE")
            .await
            .unwrap();

        assert_eq!(out.len(), 7);
        let bolso_sp = out
            .iter()
            .find(|r| r.nr_turno == 1 && r.nr_candidato == 17 && r.uf == "SP")
            .unwrap();
        assert_eq!(bolso_sp.votos, 1000);
        assert_eq!(bolso_sp.ano_eleicao, 2018);
        assert!((bolso_sp.perc_votos - 62.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_percentages_sum_to_100_per_round_and_state() {
        let out = load_eleicoes_2018(&FixedProvider(sample()), "PRESIDENTE")
            .await
            .unwrap();

        let mut sums: HashMap<(i64, String), f64> = HashMap::new();
        for r in &out {
            *sums.entry((r.nr_turno, r.uf.clone())).or_default() += r.perc_votos;
        }
        assert_eq!(sums.len(), 3);
        for (group, total) in sums {
            assert!((total - 100.0).abs() < 1e-9, "{:?} sums to {}", group, total);
        }
    }

    #[tokio::test]
    async fn test_idempotent() {
        let provider = FixedProvider(sample());
        let a = load_eleicoes_2018(&provider, "PRESIDENTE").await.unwrap();
        let b = load_eleicoes_2018(&provider, "PRESIDENTE").await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_numeric_votes_fail() {
        let mut t = munzona(&[(1, 17, "X", "SP", 1)]);
        t.lowercase_headers();
        t.rows[0][7] = "muitos".into();
        let err = aggregate_votes(&t.project(RENAME_VOTACAO_18).unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("votos"));
    }

    #[test]
    fn test_read_munzona_zip_filters_office_and_skips_br() -> Result<()> {
        let header = "\"ANO_ELEICAO\";\"NR_TURNO\";\"DS_CARGO\";\"NR_CANDIDATO\";\"NM_URNA_CANDIDATO\";\"SG_UF\";\"QT_VOTOS_NOMINAIS\"\n";
        let sp = format!(
            "{}\"2018\";\"1\";\"Presidente\";\"17\";\"JAIR BOLSONARO\";\"SP\";\"10\"\n\"2018\";\"1\";\"Governador\";\"45\";\"DORIA\";\"SP\";\"9\"\n",
            header
        );
        let ba = format!(
            "{}\"2018\";\"1\";\"Presidente\";\"13\";\"FERNANDO HADDAD\";\"BA\";\"20\"\n",
            header
        );

        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, body) in [
                ("votacao_candidato_munzona_2018_SP.csv", sp.as_str()),
                ("votacao_candidato_munzona_2018_BA.csv", ba.as_str()),
                ("votacao_candidato_munzona_2018_BR.csv", sp.as_str()),
                ("leiame.pdf", "%PDF"),
            ] {
                zip.start_file(name, options)?;
                zip.write_all(body.as_bytes())?;
            }
            zip.finish()?;
        }
        let dir = tempdir()?;
        let path = dir.path().join("votacao_candidato_munzona_2018.zip");
        std::fs::write(&path, &buf)?;

        let table = read_munzona_zip(&path, "PRESIDENTE")?;

        assert_eq!(table.len(), 2);
        let uf = table.require_column("sg_uf")?;
        let mut ufs: Vec<_> = table.rows.iter().map(|r| r[uf].as_str()).collect();
        ufs.sort();
        assert_eq!(ufs, vec!["BA", "SP"]);
        Ok(())
    }
}
