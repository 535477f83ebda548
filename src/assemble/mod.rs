// src/assemble/mod.rs

use anyhow::{Context, Result};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::Path,
};
use tracing::{info, warn};

use crate::{
    load::{
        candidates::load_candidatos,
        votes_2018::{load_eleicoes_2018, ElectionsProvider},
        votes_2022::{load_votacao_2022, ResultsSource, ResultsSummary},
    },
    schema::{
        coerce::{clean_str, parse_int},
        CandidateVotes, ColumnMap, ElectionResult, RawTable,
    },
};

pub const YEAR_2022: u16 = 2022;

/// Offices elected nationwide; their candidates sit in the `BR` registry file.
pub const NATIONAL_OFFICES: &[&str] = &["PRESIDENTE", "VICE-PRESIDENTE"];

/// Registry columns carried into the canonical table.
pub const REGISTRY_COLUMNS: &ColumnMap = &[
    ("ano_eleicao", "ano_eleicao"),
    ("nr_turno", "nr_turno"),
    ("nr_candidato", "nr_candidato"),
    ("nm_urna_candidato", "nm_urna_candidato"),
];

/// Which registry file lists candidates for `cargo` competing in `uf`.
/// Offices match ASCII case-insensitively, like the `DS_CARGO` filters.
pub fn registry_uf<'a>(cargo: &str, uf: &'a str) -> &'a str {
    if NATIONAL_OFFICES.iter().any(|o| o.eq_ignore_ascii_case(cargo.trim())) {
        "BR"
    } else {
        uf
    }
}

/// Outcome of the registry ⋈ votes join. Unmatched rows on either side are
/// dropped from the result and only counted here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinStats {
    pub matched: usize,
    pub unmatched_candidates: usize,
    pub unmatched_votes: usize,
}

#[derive(Debug, Clone)]
pub struct RegionAssembly {
    pub rows: Vec<ElectionResult>,
    pub summary: ResultsSummary,
    pub stats: JoinStats,
}

/// The full historical table plus the 2022 summary record of every region.
#[derive(Debug, Clone, Default)]
pub struct Eleicoes {
    pub rows: Vec<ElectionResult>,
    pub summaries: BTreeMap<String, ResultsSummary>,
}

/// Inner join of registry rows and vote rows on `nr_candidato`, registry
/// order first. Every output row gets `uf`.
pub fn join_candidates(
    registry: &RawTable,
    votes: &[CandidateVotes],
    uf: &str,
) -> Result<(Vec<ElectionResult>, JoinStats)> {
    let cand = registry.project(REGISTRY_COLUMNS)?;

    let mut by_number: HashMap<i64, Vec<&CandidateVotes>> = HashMap::new();
    for v in votes {
        by_number.entry(v.nr_candidato).or_default().push(v);
    }

    let mut stats = JoinStats::default();
    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();

    for (i, r) in cand.rows.iter().enumerate() {
        let nr_candidato = parse_int(&r[2])
            .with_context(|| format!("registry row {}: nr_candidato", i))?;
        let Some(matches) = by_number.get(&nr_candidato) else {
            stats.unmatched_candidates += 1;
            continue;
        };
        let ano_eleicao = parse_int(&r[0])
            .with_context(|| format!("registry row {}: ano_eleicao", i))?;
        let nr_turno = parse_int(&r[1])
            .with_context(|| format!("registry row {}: nr_turno", i))?;
        seen.insert(nr_candidato);

        for v in matches {
            stats.matched += 1;
            rows.push(ElectionResult {
                ano_eleicao,
                nr_turno,
                nr_candidato,
                nm_urna_candidato: clean_str(&r[3]).to_string(),
                uf: uf.to_string(),
                votos: v.votos,
                perc_votos: v.perc_votos,
            });
        }
    }

    stats.unmatched_votes = votes
        .iter()
        .filter(|v| !seen.contains(&v.nr_candidato))
        .count();

    Ok((rows, stats))
}

/// 2022 results for one region: registry joined with that region's votes.
pub async fn load_eleicoes_2022<S: ResultsSource>(
    tse_data_dir: &Path,
    source: &S,
    uf: &str,
    cargo: &str,
) -> Result<RegionAssembly> {
    let cand = load_candidatos(tse_data_dir, YEAR_2022, registry_uf(cargo, uf), cargo)?;
    let (votos, summary) = load_votacao_2022(source, uf, cargo).await?;

    let (rows, stats) = join_candidates(&cand, &votos, uf)
        .with_context(|| format!("joining 2022 registry with {} votes", uf))?;

    if stats.unmatched_candidates > 0 || stats.unmatched_votes > 0 {
        warn!(
            uf,
            unmatched_candidates = stats.unmatched_candidates,
            unmatched_votes = stats.unmatched_votes,
            "rows dropped by join"
        );
    }

    Ok(RegionAssembly {
        rows,
        summary,
        stats,
    })
}

/// 2018 once, then 2022 for every distinct region of the 2018 table,
/// fetched one region at a time. 2018 rows come first.
pub async fn load_eleicoes<P, S>(
    tse_data_dir: &Path,
    provider: &P,
    source: &S,
    cargo: &str,
) -> Result<Eleicoes>
where
    P: ElectionsProvider,
    S: ResultsSource,
{
    let mut rows = load_eleicoes_2018(provider, cargo).await?;
    let regions: BTreeSet<String> = rows.iter().map(|r| r.uf.clone()).collect();
    info!(rows_2018 = rows.len(), regions = regions.len(), "2018 loaded");

    let mut summaries = BTreeMap::new();
    for uf in regions {
        let region = load_eleicoes_2022(tse_data_dir, source, &uf, cargo).await?;
        info!(uf = %uf, rows = region.rows.len(), "2022 region assembled");
        rows.extend(region.rows);
        summaries.insert(uf, region.summary);
    }

    info!(rows = rows.len(), "historical table assembled");
    Ok(Eleicoes { rows, summaries })
}
