// src/load/candidates.rs

use anyhow::{Context, Result};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

use super::read_tse_csv_where;
use crate::schema::RawTable;

/// National registry file.
pub const DEFAULT_UF: &str = "BR";
pub const DEFAULT_CARGO: &str = "PRESIDENTE";

/// `{tse_data_dir}/consulta_cand_{ano}/consulta_cand_{ano}_{uf}.csv`
pub fn registry_path(tse_data_dir: &Path, ano: u16, uf: &str) -> PathBuf {
    tse_data_dir
        .join(format!("consulta_cand_{}", ano))
        .join(format!("consulta_cand_{}_{}.csv", ano, uf))
}

/// Candidate registry for one year/region, restricted to rows whose
/// `DS_CARGO` matches `cargo` (ASCII case-insensitive). Column labels come
/// back lowercased.
#[instrument(level = "debug", skip(tse_data_dir), fields(dir = %tse_data_dir.display()))]
pub fn load_candidatos(tse_data_dir: &Path, ano: u16, uf: &str, cargo: &str) -> Result<RawTable> {
    let path = registry_path(tse_data_dir, ano, uf);
    let file = File::open(&path).with_context(|| format!("reading registry {:?}", path))?;

    let cand = read_tse_csv_where(file, &path.display().to_string(), "ds_cargo", |v| {
        v.eq_ignore_ascii_case(cargo)
    })?;

    debug!(kept = cand.len(), cargo, "registry loaded");
    Ok(cand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::write_registry;
    use tempfile::tempdir;

    const REGISTRY: &str = "\
\"ANO_ELEICAO\";\"NR_TURNO\";\"DS_CARGO\";\"NR_CANDIDATO\";\"NM_URNA_CANDIDATO\"
\"2022\";\"1\";\"PRESIDENTE\";\"13\";\"LULA\"
\"2022\";\"1\";\"VICE-PRESIDENTE\";\"13\";\"GERALDO ALCKMIN\"
\"2022\";\"1\";\"PRESIDENTE\";\"22\";\"JAIR BOLSONARO\"
\"2022\";\"1\";\"GOVERNADOR\";\"45\";\"TARCISIO\"
";

    #[test]
    fn test_only_requested_office_survives() {
        let dir = tempdir().unwrap();
        write_registry(dir.path(), 2022, "BR", REGISTRY);

        let cand = load_candidatos(dir.path(), 2022, DEFAULT_UF, DEFAULT_CARGO).unwrap();

        assert_eq!(cand.len(), 2);
        let cargo = cand.require_column("ds_cargo").unwrap();
        assert!(cand.rows.iter().all(|r| r[cargo] == "PRESIDENTE"));
        assert!(cand.headers.iter().all(|h| *h == h.to_lowercase()));
    }

    #[test]
    fn test_other_office() {
        let dir = tempdir().unwrap();
        write_registry(dir.path(), 2022, "BR", REGISTRY);

        let cand = load_candidatos(dir.path(), 2022, "BR", "VICE-PRESIDENTE").unwrap();
        assert_eq!(cand.len(), 1);
        assert_eq!(cand.cell(0, 4), "GERALDO ALCKMIN");
    }

    #[test]
    fn test_office_match_ignores_case() {
        let dir = tempdir().unwrap();
        write_registry(dir.path(), 2022, "BR", REGISTRY);

        let cand = load_candidatos(dir.path(), 2022, "BR", "Presidente").unwrap();
        assert_eq!(cand.len(), 2);
    }

    #[test]
    fn test_missing_file_propagates() {
        let dir = tempdir().unwrap();
        let err = load_candidatos(dir.path(), 2018, "SP", DEFAULT_CARGO).unwrap_err();
        assert!(format!("{:#}", err).contains("consulta_cand_2018_SP.csv"));
    }
}
