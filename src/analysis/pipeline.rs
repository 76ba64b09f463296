use super::cutoff::analyze_contest;
use super::history::{select_elections, SelectedElection, DEFAULT_ELECTION_LIMIT};
use super::ranking::build_field;
use super::{AnalysisError, AnalysisResponse, AnalysisResult, AnalysisSummary, ContestAnalysis};
use crate::slug::parse_candidate_slug;
use crate::source::ElectoralSource;
use futures::future::join_all;
use instant::Instant;
use itertools::Itertools;
use tracing::{debug, info, warn};

/// Contests where the weakest elected rival was fewer than this many votes
/// ahead count as real opportunities.
pub const REAL_OPPORTUNITY_THRESHOLD: i64 = 500;

/// Run the full cutoff-block analysis for the candidate named by `slug`.
///
/// Only candidate resolution and the history fetch can fail the call; a
/// contest whose field cannot be fetched or analyzed is left out.
pub async fn analyze_candidate<S>(source: &S, slug: &str) -> AnalysisResult<AnalysisResponse>
where
    S: ElectoralSource + Sync,
{
    let start = Instant::now();
    let parsed = parse_candidate_slug(slug)?;

    let matches = source.resolve_candidate(&parsed).await?;
    let party = match matches.first() {
        Some(first) => first.party.clone(),
        None => return Err(AnalysisError::CandidateNotFound(slug.to_string())),
    };
    let candidate_ids: Vec<i64> = matches.iter().map(|m| m.candidate_id).unique().collect();

    let history = source.votes_for_candidates(&candidate_ids).await?;
    let selected = select_elections(&history, DEFAULT_ELECTION_LIMIT);
    debug!(
        slug,
        ids = ?candidate_ids,
        history_rows = history.len(),
        selected = selected.len(),
        "selected elections"
    );

    let analyses: Vec<ContestAnalysis> = join_all(
        selected
            .iter()
            .map(|election| analyze_election(source, election, &candidate_ids, &party)),
    )
    .await
    .into_iter()
    .flatten()
    .collect();

    info!(
        slug,
        analyzed = analyses.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );

    Ok(AnalysisResponse {
        summary: summarize(&analyses),
        analyses,
    })
}

async fn analyze_election<S>(
    source: &S,
    election: &SelectedElection,
    candidate_ids: &[i64],
    party: &str,
) -> Option<ContestAnalysis>
where
    S: ElectoralSource + Sync,
{
    let contest = &election.contest;
    let rows = match source.votes_for_contest(contest).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                year = contest.year,
                office = %contest.office,
                error = %e,
                "skipping contest, field fetch failed"
            );
            return None;
        }
    };

    let field = build_field(rows);
    let analysis = analyze_contest(contest, &field, candidate_ids, party);
    if analysis.is_none() {
        debug!(
            year = contest.year,
            office = %contest.office,
            candidates = field.len(),
            "contest not analyzable"
        );
    }
    analysis
}

pub fn summarize(analyses: &[ContestAnalysis]) -> AnalysisSummary {
    AnalysisSummary {
        total_elections: analyses.len(),
        times_in_block: analyses
            .iter()
            .filter(|a| a.candidate.in_cutoff_block)
            .count(),
        real_opportunities: analyses
            .iter()
            .filter(|a| {
                a.worst_elected_external
                    .as_ref()
                    .map_or(false, |w| w.opportunity_score < REAL_OPPORTUNITY_THRESHOLD)
            })
            .count(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::VoteRecord;
    use crate::source::memory::MemorySource;
    use crate::source::CandidateMatch;
    use std::sync::atomic::Ordering;

    fn rec(
        id: i64,
        party: &str,
        municipality: &str,
        year: i32,
        office: &str,
        votes: i64,
        status: &str,
    ) -> VoteRecord {
        let name = if id == 100 || id == 200 {
            "MARIA SOUZA".to_string()
        } else {
            format!("RIVAL {}", id)
        };
        VoteRecord {
            candidate_id: id,
            ballot_name: name.clone(),
            name,
            party: party.into(),
            municipality: Some(municipality.into()),
            state: "PE".into(),
            year,
            office: office.into(),
            round: 1,
            votes,
            status: Some(status.into()),
        }
    }

    fn view_row(id: i64, year: i32, office: &str, votes: i64, municipalities: i64) -> CandidateMatch {
        CandidateMatch {
            candidate_id: id,
            ballot_name: "MARIA SOUZA".into(),
            name: "MARIA SOUZA".into(),
            party: "PT".into(),
            year,
            office: office.into(),
            round: 1,
            status: Some("SUPLENTE".into()),
            total_votes: votes,
            municipalities,
        }
    }

    /// Candidate ids 100 and 200 are the same person, `pe-maria-souza`.
    pub(crate) fn dataset() -> MemorySource {
        let rows = vec![
            // 2022, statewide: target fourth, inside the block.
            rec(1, "PL", "RECIFE", 2022, "DEPUTADO FEDERAL", 500, "ELEITO POR QP"),
            rec(1, "PL", "OLINDA", 2022, "DEPUTADO FEDERAL", 500, "ELEITO POR QP"),
            rec(2, "PSB", "RECIFE", 2022, "DEPUTADO FEDERAL", 800, "ELEITO POR QP"),
            rec(100, "PT", "RECIFE", 2022, "DEPUTADO FEDERAL", 400, "SUPLENTE"),
            rec(100, "PT", "OLINDA", 2022, "DEPUTADO FEDERAL", 300, "SUPLENTE"),
            rec(3, "PT", "RECIFE", 2022, "DEPUTADO FEDERAL", 750, "ELEITO POR MÉDIA"),
            rec(4, "PDT", "OLINDA", 2022, "DEPUTADO FEDERAL", 100, "NÃO ELEITO"),
            // 2024, municipal: one seat, far behind.
            rec(5, "PL", "RECIFE", 2024, "VEREADOR", 3000, "ELEITO"),
            rec(6, "MDB", "RECIFE", 2024, "VEREADOR", 2000, "SUPLENTE"),
            rec(100, "PT", "RECIFE", 2024, "VEREADOR", 50, "SUPLENTE"),
            // 2018, under an older registration, no elected data.
            rec(200, "PT", "RECIFE", 2018, "DEPUTADO ESTADUAL", 900, "SUPLENTE"),
            rec(7, "PL", "RECIFE", 2018, "DEPUTADO ESTADUAL", 1900, "SUPLENTE"),
        ];

        MemorySource {
            matches: vec![
                view_row(100, 2022, "DEPUTADO FEDERAL", 700, 2),
                view_row(100, 2024, "VEREADOR", 50, 1),
                view_row(200, 2018, "DEPUTADO ESTADUAL", 900, 1),
            ],
            rows,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_analysis() {
        let source = dataset();
        let response = analyze_candidate(&source, "pe-maria-souza").await.unwrap();

        assert_eq!(
            vec![2024, 2022],
            response.analyses.iter().map(|a| a.year).collect::<Vec<_>>()
        );
        assert_eq!(3, source.contest_fetches.load(Ordering::SeqCst));

        let municipal = &response.analyses[0];
        assert_eq!("RECIFE", municipal.scope_name);
        assert_eq!(1, municipal.metrics.seats);
        assert_eq!(6, municipal.metrics.block_size);
        assert_eq!(3, municipal.candidate.position);
        assert_eq!(2950, municipal.worst_elected_external.as_ref().unwrap().opportunity_score);

        let statewide = &response.analyses[1];
        assert_eq!("PE", statewide.scope_name);
        assert_eq!(3, statewide.metrics.seats);
        assert_eq!(700, statewide.candidate.votes);
        assert_eq!(4, statewide.candidate.position);
        assert_eq!(50, statewide.internal_competitor.as_ref().unwrap().vote_difference);
        let worst = statewide.worst_elected_external.as_ref().unwrap();
        assert_eq!("PSB", worst.party);
        assert_eq!(100, worst.opportunity_score);

        assert_eq!(
            AnalysisSummary {
                total_elections: 2,
                times_in_block: 2,
                real_opportunities: 1,
            },
            response.summary
        );
    }

    #[tokio::test]
    async fn test_invalid_slug() {
        let result = analyze_candidate(&dataset(), "pe").await;
        assert!(matches!(result, Err(AnalysisError::InvalidSlug(_))));
    }

    #[tokio::test]
    async fn test_unknown_candidate() {
        let result = analyze_candidate(&dataset(), "pe-fulano-de-tal").await;
        assert!(matches!(result, Err(AnalysisError::CandidateNotFound(_))));
    }

    #[tokio::test]
    async fn test_history_failure_is_fatal() {
        let mut source = dataset();
        source.fail_history = true;
        let result = analyze_candidate(&source, "pe-maria-souza").await;
        assert!(matches!(result, Err(AnalysisError::Source(_))));
    }

    #[tokio::test]
    async fn test_contest_failure_is_skipped() {
        let mut source = dataset();
        source
            .broken_contests
            .insert((2022, "DEPUTADO FEDERAL".to_string()));
        let response = analyze_candidate(&source, "pe-maria-souza").await.unwrap();
        assert_eq!(1, response.analyses.len());
        assert_eq!(2024, response.analyses[0].year);
        assert_eq!(1, response.summary.total_elections);
        assert_eq!(0, response.summary.real_opportunities);
    }

    #[tokio::test]
    async fn test_only_four_most_recent_years() {
        let mut source = dataset();
        for year in [2008, 2010, 2012] {
            source
                .rows
                .push(rec(100, "PT", "RECIFE", year, "VEREADOR", 10, "SUPLENTE"));
        }
        analyze_candidate(&source, "pe-maria-souza").await.unwrap();
        // 2024, 2022, 2018, 2012
        assert_eq!(4, source.contest_fetches.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_analysis_is_idempotent() {
        let source = dataset();
        let first = analyze_candidate(&source, "pe-maria-souza").await.unwrap();
        let second = analyze_candidate(&source, "pe-maria-souza").await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_summary_of_nothing() {
        assert_eq!(
            AnalysisSummary {
                total_elections: 0,
                times_in_block: 0,
                real_opportunities: 0,
            },
            summarize(&[])
        );
    }
}
