use crate::analysis::ranking::RankedCandidate;
use crate::slug::SlugError;
use crate::source::SourceError;
use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod cutoff;
pub mod history;
pub mod pipeline;
pub mod profile;
pub mod ranking;

pub use pipeline::analyze_candidate;
pub use profile::{candidate_profile, CandidateProfile};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    InvalidSlug(#[from] SlugError),
    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),
    #[error("Upstream error: {0}")]
    Source(#[from] SourceError),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Full answer for one candidate: every analyzable contest plus a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(rename = "analises")]
    pub analyses: Vec<ContestAnalysis>,
    #[serde(rename = "resumo")]
    pub summary: AnalysisSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(rename = "total_eleicoes")]
    pub total_elections: usize,
    #[serde(rename = "vezes_no_bloco")]
    pub times_in_block: usize,
    #[serde(rename = "oportunidades_reais")]
    pub real_opportunities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestAnalysis {
    #[serde(rename = "ano_eleicao")]
    pub year: i32,
    /// Municipality name, or the state code for statewide contests.
    #[serde(rename = "nm_municipio")]
    pub scope_name: String,
    #[serde(rename = "sg_uf")]
    pub state: String,
    #[serde(rename = "ds_cargo")]
    pub office: String,
    #[serde(rename = "nr_turno")]
    pub round: i32,
    #[serde(rename = "candidato")]
    pub candidate: TargetStanding,
    #[serde(rename = "metricas")]
    pub metrics: ContestMetrics,
    #[serde(rename = "concorrente_interno")]
    pub internal_competitor: Option<InternalCompetitor>,
    #[serde(rename = "concorrente_externo")]
    pub external_competitor: Option<ExternalCompetitor>,
    #[serde(rename = "pior_eleito_externo")]
    pub worst_elected_external: Option<ExternalCompetitor>,
    #[serde(rename = "partidos_eficiencia")]
    pub party_efficiency: Vec<PartyEfficiency>,
    #[serde(rename = "bloco_corte")]
    pub cutoff_block: Vec<RankedCandidate>,
}

/// The analyzed candidate inside one contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStanding {
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "nm_candidato")]
    pub name: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "total_votos")]
    pub votes: i64,
    #[serde(rename = "posicao")]
    pub position: usize,
    #[serde(rename = "eleito")]
    pub elected: bool,
    #[serde(rename = "ds_sit_tot_turno")]
    pub status: String,
    #[serde(rename = "no_bloco_corte")]
    pub in_cutoff_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestMetrics {
    #[serde(rename = "total_candidatos")]
    pub total_candidates: usize,
    #[serde(rename = "vagas")]
    pub seats: usize,
    #[serde(rename = "bloco_corte_tamanho")]
    pub block_size: usize,
    /// Votes of the last elected candidate.
    #[serde(rename = "votos_corte")]
    pub votes_at_cutoff: i64,
    /// Votes of the last candidate inside the cutoff block.
    #[serde(rename = "votos_ultimo_bloco")]
    pub votes_at_block_edge: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalCompetitor {
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "sg_uf")]
    pub state: String,
    pub slug: String,
    #[serde(rename = "total_votos")]
    pub votes: i64,
    #[serde(rename = "diferenca_votos")]
    pub vote_difference: i64,
    #[serde(rename = "posicao")]
    pub position: usize,
    #[serde(rename = "eleito")]
    pub elected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitorKind {
    /// Lowest-voted elected candidate of another party.
    #[serde(rename = "pior_eleito")]
    WorstElected,
    /// Closest candidate of another party with more votes.
    #[serde(rename = "proximo_acima")]
    NearestAbove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCompetitor {
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "sg_uf")]
    pub state: String,
    pub slug: String,
    #[serde(rename = "total_votos")]
    pub votes: i64,
    #[serde(rename = "diferenca_votos")]
    pub vote_difference: i64,
    #[serde(rename = "posicao")]
    pub position: usize,
    #[serde(rename = "tipo")]
    pub kind: CompetitorKind,
    /// Votes the analyzed candidate was short of this competitor; negative
    /// when already ahead.
    #[serde(rename = "score_oportunidade")]
    pub opportunity_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyEfficiency {
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "candidatos_bloco")]
    pub candidates_in_block: usize,
    #[serde(rename = "total_votos")]
    pub total_votes: i64,
    #[serde(rename = "eleitos")]
    pub elected: usize,
    #[serde(rename = "media_votos")]
    pub mean_votes: i64,
    /// `elected / candidates_in_block`.
    #[serde(rename = "eficiencia")]
    pub efficiency: f64,
}
