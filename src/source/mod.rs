//! The remote tabular store the analysis reads from.

use crate::model::vote::{lenient_i32, lenient_i64};
use crate::model::{ElectionContest, VoteRecord};
use crate::slug::CandidateSlug;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub mod postgrest;

pub use postgrest::PostgrestSource;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Upstream returned status {status} for {resource}")]
    Status { status: u16, resource: String },
    #[error("Malformed rows from {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Contest cannot be queried: {0}")]
    Unqueryable(String),
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// One row of `mv_votos_candidato`: a candidate identity plus their totals in
/// a single election. Resolution returns one per election the candidate ran
/// in; the election columns default when a lookup does not return them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    #[serde(rename = "sq_candidato", deserialize_with = "lenient_i64")]
    pub candidate_id: i64,
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "nm_candidato")]
    pub name: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "ano_eleicao", default, deserialize_with = "lenient_i32")]
    pub year: i32,
    #[serde(rename = "ds_cargo", default)]
    pub office: String,
    #[serde(rename = "nr_turno", default, deserialize_with = "lenient_i32")]
    pub round: i32,
    #[serde(rename = "ds_sit_tot_turno", default)]
    pub status: Option<String>,
    #[serde(rename = "total_votos", default, deserialize_with = "lenient_i64")]
    pub total_votes: i64,
    #[serde(rename = "municipios_votados", default, deserialize_with = "lenient_i64")]
    pub municipalities: i64,
}

/// Queries the analysis needs from the electoral dataset.
pub trait ElectoralSource {
    /// Candidates matching a slug's state and name. Empty when nothing matches.
    fn resolve_candidate(
        &self,
        slug: &CandidateSlug,
    ) -> impl Future<Output = Result<Vec<CandidateMatch>>> + Send;

    /// Every zone-level row of the given candidates, all years and offices.
    fn votes_for_candidates(
        &self,
        candidate_ids: &[i64],
    ) -> impl Future<Output = Result<Vec<VoteRecord>>> + Send;

    /// Every zone-level row of every candidate in one contest.
    fn votes_for_contest(
        &self,
        contest: &ElectionContest,
    ) -> impl Future<Output = Result<Vec<VoteRecord>>> + Send;
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory dataset for pipeline tests.
    #[derive(Default)]
    pub(crate) struct MemorySource {
        pub matches: Vec<CandidateMatch>,
        pub rows: Vec<VoteRecord>,
        /// Contests whose fetch fails with a status error.
        pub broken_contests: HashSet<(i32, String)>,
        pub fail_history: bool,
        pub contest_fetches: AtomicUsize,
    }

    impl ElectoralSource for MemorySource {
        async fn resolve_candidate(&self, slug: &CandidateSlug) -> Result<Vec<CandidateMatch>> {
            Ok(self
                .matches
                .iter()
                .filter(|m| m.name.contains(&slug.full_name))
                .cloned()
                .collect())
        }

        async fn votes_for_candidates(&self, candidate_ids: &[i64]) -> Result<Vec<VoteRecord>> {
            if self.fail_history {
                return Err(SourceError::Status {
                    status: 503,
                    resource: "votacao_candidato_munzona".into(),
                });
            }
            Ok(self
                .rows
                .iter()
                .filter(|r| candidate_ids.contains(&r.candidate_id))
                .cloned()
                .collect())
        }

        async fn votes_for_contest(&self, contest: &ElectionContest) -> Result<Vec<VoteRecord>> {
            self.contest_fetches.fetch_add(1, Ordering::SeqCst);
            if self
                .broken_contests
                .contains(&(contest.year, contest.office.clone()))
            {
                return Err(SourceError::Status {
                    status: 500,
                    resource: "votacao_candidato_munzona".into(),
                });
            }
            Ok(self
                .rows
                .iter()
                .filter(|r| ElectionContest::from_record(r) == *contest)
                .cloned()
                .collect())
        }
    }
}
