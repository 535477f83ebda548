// src/schema/types.rs

/// Column names of the canonical election table, in output order.
pub const CANONICAL_COLUMNS: [&str; 7] = [
    "ano_eleicao",
    "nr_turno",
    "nr_candidato",
    "nm_urna_candidato",
    "uf",
    "votos",
    "perc_votos",
];

/// One row of the unified election table. Every year-specific loader
/// produces these, so adding a year means writing one more loader that
/// ends in `Vec<ElectionResult>`.
#[derive(Debug, PartialEq, Clone)]
pub struct ElectionResult {
    pub ano_eleicao: i64,
    pub nr_turno: i64,
    pub nr_candidato: i64,
    pub nm_urna_candidato: String,
    pub uf: String,
    pub votos: i64,
    pub perc_votos: f64,
}

impl ElectionResult {
    /// Field values rendered in `CANONICAL_COLUMNS` order.
    pub fn to_record(&self) -> [String; 7] {
        [
            self.ano_eleicao.to_string(),
            self.nr_turno.to_string(),
            self.nr_candidato.to_string(),
            self.nm_urna_candidato.clone(),
            self.uf.clone(),
            self.votos.to_string(),
            format_perc(self.perc_votos),
        ]
    }
}

/// Whole percentages keep one decimal (`100.0`, not `100`) so the column
/// always reads as floating point.
pub fn format_perc(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// Per-candidate tally from the 2022 results feed.
#[derive(Debug, PartialEq, Clone)]
pub struct CandidateVotes {
    pub nr_candidato: i64,
    pub votos: i64,
    pub perc_votos: f64,
}
