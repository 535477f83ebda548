// src/load/votes_2022.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::{
    config::{cargo_code, results_url, DEFAULT_ELECTION_ID, RESULTADOS_BASE_URL},
    schema::{
        coerce::{parse_decimal_comma, parse_int},
        CandidateVotes, ColumnMap, RawTable,
    },
};

/// Feed columns → canonical columns.
pub const RENAME_VOTACAO_22: &ColumnMap = &[
    ("n", "nr_candidato"),
    ("vap", "votos"),
    ("pvap", "perc_votos"),
];

/// Top-level fields of a results document, minus the candidate array.
pub type ResultsSummary = Map<String, Value>;

/// Where per-region results documents come from. `cargo` is the office,
/// spelled as in `DS_CARGO`.
#[allow(async_fn_in_trait)]
pub trait ResultsSource {
    async fn fetch_results(&self, uf: &str, cargo: &str) -> Result<Value>;
}

/// The official results API ("dados simplificados" documents).
pub struct TseResultsApi {
    client: Client,
    base_url: String,
    election_id: u32,
}

impl TseResultsApi {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: RESULTADOS_BASE_URL.to_string(),
            election_id: DEFAULT_ELECTION_ID,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_election_id(mut self, election_id: u32) -> Self {
        self.election_id = election_id;
        self
    }
}

impl ResultsSource for TseResultsApi {
    #[instrument(level = "info", skip(self), fields(election = self.election_id))]
    async fn fetch_results(&self, uf: &str, cargo: &str) -> Result<Value> {
        let code = cargo_code(cargo)?;
        let url = results_url(&self.base_url, self.election_id, code, uf);
        debug!(%url, "fetching results");
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .json::<Value>()
            .await
            .with_context(|| format!("decoding JSON from {}", url))
    }
}

/// Per-candidate 2022 votes for `cargo` in one region, plus the region summary.
pub async fn load_votacao_2022<S: ResultsSource>(
    source: &S,
    uf: &str,
    cargo: &str,
) -> Result<(Vec<CandidateVotes>, ResultsSummary)> {
    let doc = source.fetch_results(uf, cargo).await?;
    parse_results(doc).with_context(|| format!("parsing results for {}", uf))
}

/// Split a results document into typed candidate rows and the summary record.
pub fn parse_results(doc: Value) -> Result<(Vec<CandidateVotes>, ResultsSummary)> {
    let Value::Object(mut summary) = doc else {
        return Err(anyhow!("results document is not a JSON object"));
    };
    let cand = match summary.remove("cand") {
        Some(Value::Array(items)) => items,
        Some(other) => return Err(anyhow!("`cand` is not an array: {}", other)),
        None => return Err(anyhow!("results document has no `cand` field")),
    };

    let votos = flatten_records(&cand)?.project(RENAME_VOTACAO_22)?;
    let mut out = Vec::with_capacity(votos.len());
    for (i, row) in votos.rows.iter().enumerate() {
        out.push(CandidateVotes {
            nr_candidato: parse_int(&row[0]).with_context(|| format!("cand[{}].n", i))?,
            votos: parse_int(&row[1]).with_context(|| format!("cand[{}].vap", i))?,
            perc_votos: parse_decimal_comma(&row[2])
                .with_context(|| format!("cand[{}].pvap", i))?,
        });
    }

    Ok((out, summary))
}

/// One row per array element; nested objects become `parent.child` columns.
/// Columns are the union of keys in first-seen order.
pub fn flatten_records(items: &[Value]) -> Result<RawTable> {
    let mut table = RawTable::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut flat_rows = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| anyhow!("record {} is not an object", i))?;
        let mut flat = Vec::new();
        flatten_object("", obj, &mut flat);
        for (key, _) in &flat {
            if !index.contains_key(key) {
                index.insert(key.clone(), table.headers.len());
                table.headers.push(key.clone());
            }
        }
        flat_rows.push(flat);
    }

    for flat in flat_rows {
        let mut row = vec![String::new(); table.headers.len()];
        for (key, value) in flat {
            row[index[&key]] = value;
        }
        table.rows.push(row);
    }

    Ok(table)
}

fn flatten_object(prefix: &str, obj: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in obj {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten_object(&name, inner, out),
            Value::String(s) => out.push((name, s.clone())),
            Value::Null => out.push((name, String::new())),
            other => out.push((name, other.to_string())),
        }
    }
}
