// src/config.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing_subscriber::EnvFilter;

/// TSE open-data CDN, bulk ZIPs by dataset.
pub const ODSELE_BASE_URL: &str = "https://cdn.tse.jus.br/estatistica/sead/odsele";

/// Official results API root.
pub const RESULTADOS_BASE_URL: &str = "https://resultados.tse.jus.br/oficial";

/// First round of the 2022 federal election in the results API.
pub const DEFAULT_ELECTION_ID: u32 = 544;

/// Years whose candidate registries the download step fetches.
pub const DEFAULT_REGISTRY_YEARS: &[u16] = &[2022, 2018];

/// The CDN rejects requests without a browser-ish agent.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Shared HTTP client for every fetch in a run.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}

/// Log filter for the binaries: `RUST_LOG` when set and valid, else `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok(), default)
}

fn filter_from(directives: Option<String>, default: &str) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// `consulta_cand_{year}.zip`
pub fn registry_zip_url(year: u16) -> String {
    format!(
        "{}/consulta_cand/consulta_cand_{}.zip",
        ODSELE_BASE_URL, year
    )
}

/// `votacao_candidato_munzona_{year}.zip`
pub fn munzona_zip_url(year: u16) -> String {
    format!(
        "{}/votacao_candidato_munzona/votacao_candidato_munzona_{}.zip",
        ODSELE_BASE_URL, year
    )
}

/// Results API office codes by `DS_CARGO` spelling. Running mates
/// (`VICE-*`, `SUPLENTE`) have no feed of their own.
pub const CARGO_CODES: &[(&str, u32)] = &[
    ("PRESIDENTE", 1),
    ("GOVERNADOR", 3),
    ("SENADOR", 5),
    ("DEPUTADO FEDERAL", 6),
    ("DEPUTADO ESTADUAL", 7),
    ("DEPUTADO DISTRITAL", 8),
];

/// Office code for `cargo`, matched ASCII case-insensitively.
pub fn cargo_code(cargo: &str) -> Result<u32> {
    CARGO_CODES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(cargo.trim()))
        .map(|&(_, code)| code)
        .ok_or_else(|| anyhow!("no results feed for office {:?}", cargo))
}

/// Simplified results document for one office in one region. `uf` is
/// lowercased as the API expects.
pub fn results_url(base: &str, election_id: u32, cargo_code: u32, uf: &str) -> String {
    let ufl = uf.to_lowercase();
    format!(
        "{base}/ele2022/{id}/dados-simplificados/{ufl}/{ufl}-c{cargo:04}-e{id:06}-r.json",
        base = base.trim_end_matches('/'),
        id = election_id,
        cargo = cargo_code,
        ufl = ufl,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_url_matches_api_layout() {
        assert_eq!(
            results_url(RESULTADOS_BASE_URL, DEFAULT_ELECTION_ID, 1, "SP"),
            "https://resultados.tse.jus.br/oficial/ele2022/544/dados-simplificados/sp/sp-c0001-e000544-r.json"
        );
        assert_eq!(
            results_url(RESULTADOS_BASE_URL, DEFAULT_ELECTION_ID, 3, "BA"),
            "https://resultados.tse.jus.br/oficial/ele2022/544/dados-simplificados/ba/ba-c0003-e000544-r.json"
        );
    }

    #[test]
    fn office_codes() {
        assert_eq!(cargo_code("PRESIDENTE").unwrap(), 1);
        assert_eq!(cargo_code("Governador").unwrap(), 3);
        assert_eq!(cargo_code("deputado federal").unwrap(), 6);
        assert!(cargo_code("VICE-PRESIDENTE").is_err());
    }

    #[test]
    fn log_filter_prefers_rust_log() {
        assert_eq!(filter_from(Some("debug".into()), "info").to_string(), "debug");
        assert_eq!(
            filter_from(Some("tsescraper=trace".into()), "info").to_string(),
            "tsescraper=trace"
        );
        assert_eq!(filter_from(None, "info").to_string(), "info");
        assert_eq!(filter_from(Some("  ".into()), "info").to_string(), "info");
    }

    #[test]
    fn bulk_urls() {
        assert_eq!(
            registry_zip_url(2022),
            "https://cdn.tse.jus.br/estatistica/sead/odsele/consulta_cand/consulta_cand_2022.zip"
        );
        assert!(munzona_zip_url(2018).ends_with("/votacao_candidato_munzona_2018.zip"));
    }
}
