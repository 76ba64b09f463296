//! Candidate profile: every election a candidate ran in, where their votes
//! came from, and career totals.

use super::aggregate::{aggregate, GroupKey};
use super::ranking::is_elected;
use super::{AnalysisError, AnalysisResult};
use crate::model::VoteRecord;
use crate::slug::parse_candidate_slug;
use crate::source::{CandidateMatch, ElectoralSource};
use instant::Instant;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(rename = "nm_candidato")]
    pub name: String,
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "sg_uf")]
    pub state: String,
    /// Most recent first.
    #[serde(rename = "eleicoes")]
    pub elections: Vec<ElectionSummary>,
    #[serde(rename = "municipiosRanking")]
    pub municipality_ranking: Vec<MunicipalityVotes>,
    pub stats: CareerStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    #[serde(rename = "ano_eleicao")]
    pub year: i32,
    #[serde(rename = "ds_cargo")]
    pub office: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "nr_turno")]
    pub round: i32,
    #[serde(rename = "ds_sit_tot_turno")]
    pub status: String,
    #[serde(rename = "total_votos")]
    pub total_votes: i64,
    #[serde(rename = "municipios_count")]
    pub municipalities: i64,
}

impl From<&CandidateMatch> for ElectionSummary {
    fn from(row: &CandidateMatch) -> Self {
        ElectionSummary {
            year: row.year,
            office: row.office.clone(),
            party: row.party.clone(),
            round: row.round,
            status: row.status.clone().unwrap_or_default(),
            total_votes: row.total_votes,
            municipalities: row.municipalities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityVotes {
    #[serde(rename = "nm_municipio")]
    pub municipality: String,
    #[serde(rename = "total_votos")]
    pub total_votes: i64,
    /// Share of the candidate's career total, 0 to 100.
    #[serde(rename = "percentual")]
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerStats {
    #[serde(rename = "total_votos")]
    pub total_votes: i64,
    #[serde(rename = "anos_ativo")]
    pub active_years: Vec<i32>,
    #[serde(rename = "partidos")]
    pub parties: Vec<String>,
    #[serde(rename = "cargos")]
    pub offices: Vec<String>,
    #[serde(rename = "vitorias")]
    pub wins: usize,
    #[serde(rename = "derrotas")]
    pub losses: usize,
}

/// Build the profile of the candidate named by `slug`.
///
/// A failed zone-level fetch only empties the municipality ranking.
pub async fn candidate_profile<S>(source: &S, slug: &str) -> AnalysisResult<CandidateProfile>
where
    S: ElectoralSource + Sync,
{
    let start = Instant::now();
    let parsed = parse_candidate_slug(slug)?;

    let matches = source.resolve_candidate(&parsed).await?;
    if matches.is_empty() {
        return Err(AnalysisError::CandidateNotFound(slug.to_string()));
    }

    let candidate_ids: Vec<i64> = matches
        .iter()
        .map(|m| m.candidate_id)
        .filter(|id| *id != 0)
        .unique()
        .collect();
    let zone_rows = match source.votes_for_candidates(&candidate_ids).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(slug, error = %e, "municipality ranking unavailable");
            Vec::new()
        }
    };

    let profile = build_profile(&parsed.uf, &matches, &zone_rows)
        .ok_or_else(|| AnalysisError::CandidateNotFound(slug.to_string()))?;

    info!(
        slug,
        elections = profile.elections.len(),
        municipalities = profile.municipality_ranking.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "profile complete"
    );

    Ok(profile)
}

/// Assemble a profile from the per-election view rows and the zone-level
/// vote rows of the same candidate. `None` without any view row.
pub fn build_profile(
    uf: &str,
    matches: &[CandidateMatch],
    zone_rows: &[VoteRecord],
) -> Option<CandidateProfile> {
    let first = matches.first()?;

    let elections: Vec<ElectionSummary> = matches
        .iter()
        .map(ElectionSummary::from)
        .sorted_by(|a, b| b.year.cmp(&a.year))
        .collect();
    let stats = career_stats(&elections);

    Some(CandidateProfile {
        name: first.name.clone(),
        ballot_name: first.ballot_name.clone(),
        state: uf.to_string(),
        municipality_ranking: municipality_ranking(zone_rows, stats.total_votes),
        elections,
        stats,
    })
}

/// Votes per municipality, highest first, with each municipality's share of
/// `candidate_total`.
pub fn municipality_ranking(zone_rows: &[VoteRecord], candidate_total: i64) -> Vec<MunicipalityVotes> {
    aggregate(zone_rows, |r| r.municipality.clone(), |r| r.votes)
        .into_iter()
        .map(|group| MunicipalityVotes {
            municipality: group
                .key
                .unwrap_or_else(|| GroupKey::MISSING.to_string()),
            total_votes: group.total_votes,
            share: percentage(group.total_votes, candidate_total),
        })
        .sorted_by(|a, b| b.total_votes.cmp(&a.total_votes))
        .collect()
}

pub fn career_stats(elections: &[ElectionSummary]) -> CareerStats {
    let wins = elections.iter().filter(|e| is_elected(&e.status)).count();

    CareerStats {
        total_votes: elections.iter().map(|e| e.total_votes).sum(),
        active_years: elections.iter().map(|e| e.year).unique().collect(),
        parties: elections.iter().map(|e| e.party.clone()).unique().collect(),
        offices: elections.iter().map(|e| e.office.clone()).unique().collect(),
        wins,
        losses: elections.len() - wins,
    }
}

fn percentage(part: i64, total: i64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}
