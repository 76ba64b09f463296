use crate::analysis::aggregate::{aggregate, Aggregate};
use crate::model::VoteRecord;
use crate::slug::{candidate_slug, fold_accents};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A candidate's standing in the full field of one contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(rename = "sq_candidato")]
    pub candidate_id: i64,
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "nm_candidato")]
    pub name: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "sg_uf")]
    pub state: String,
    #[serde(rename = "total_votos")]
    pub votes: i64,
    #[serde(rename = "ds_sit_tot_turno")]
    pub status: String,
    #[serde(rename = "eleito")]
    pub elected: bool,
    #[serde(rename = "posicao")]
    pub position: usize,
    pub slug: String,
}

/// Classify a `ds_sit_tot_turno` text. Accepts plain election, party-quotient
/// (`QP`) and average (`MÉDIA`) seats; `NÃO ELEITO` always wins.
pub fn is_elected(status: &str) -> bool {
    let status = fold_accents(status).to_uppercase();
    if status.contains("NAO ELEITO") {
        return false;
    }
    status.contains("ELEITO") || status.contains("MEDIA") || status.contains("QP")
}

/// Collapse zone-level rows of one contest into per-candidate totals and rank
/// them.
pub fn build_field(rows: Vec<VoteRecord>) -> Vec<RankedCandidate> {
    rank_field(aggregate(rows, |r| r.candidate_id, |r| r.votes))
}

/// Order by votes descending; equal totals are ordered by candidate id so the
/// ranking does not depend on the order rows came back in.
pub fn rank_field(candidates: Vec<Aggregate<i64, VoteRecord>>) -> Vec<RankedCandidate> {
    candidates
        .into_iter()
        .sorted_by(|a, b| {
            b.total_votes
                .cmp(&a.total_votes)
                .then_with(|| a.key.cmp(&b.key))
        })
        .enumerate()
        .map(|(i, candidate)| {
            let record = candidate.first;
            let status = record.status.unwrap_or_default();
            RankedCandidate {
                candidate_id: candidate.key,
                slug: candidate_slug(&record.state, &record.name),
                ballot_name: record.ballot_name,
                name: record.name,
                party: record.party,
                state: record.state,
                votes: candidate.total_votes,
                elected: is_elected(&status),
                status,
                position: i + 1,
            }
        })
        .collect()
}
