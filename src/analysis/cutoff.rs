//! Cutoff-block ("bloco de corte") analysis of one contest.
//!
//! The cutoff block is the top of the ranked field sized past the number of
//! seats, `max(ceil(seats * 1.5), seats + 5)`, which is where the competition
//! that decides the last seats actually happens. Competitors are measured
//! against the analyzed candidate by raw vote difference.

use super::aggregate::aggregate;
use super::ranking::RankedCandidate;
use super::{
    CompetitorKind, ContestAnalysis, ContestMetrics, ExternalCompetitor, InternalCompetitor,
    PartyEfficiency, TargetStanding,
};
use crate::model::ElectionContest;
use std::cmp::Ordering;

pub fn cutoff_block_size(seats: usize) -> usize {
    let one_and_a_half = (seats * 3 + 1) / 2;
    one_and_a_half.max(seats + 5)
}

/// Analyze `target_ids` inside an already ranked `field`.
///
/// Returns `None` when the contest has no elected candidate or the target did
/// not run in it. Competitor comparisons use `target_party`, the party the
/// candidate was resolved with, not necessarily the party of this contest.
pub fn analyze_contest(
    contest: &ElectionContest,
    field: &[RankedCandidate],
    target_ids: &[i64],
    target_party: &str,
) -> Option<ContestAnalysis> {
    let seats = field.iter().filter(|c| c.elected).count();
    if seats == 0 {
        return None;
    }

    let block_size = cutoff_block_size(seats);
    let block = &field[..block_size.min(field.len())];

    let target = field
        .iter()
        .find(|c| target_ids.contains(&c.candidate_id))?;

    let votes_at_cutoff = field
        .iter()
        .filter(|c| c.elected)
        .last()
        .map_or(0, |c| c.votes);
    let votes_at_block_edge = block.last().map_or(0, |c| c.votes);

    // Field is sorted by votes descending, so the last match above the target
    // is the nearest one.
    let nearest_above = |same_party: bool| {
        field
            .iter()
            .filter(|c| (c.party == target_party) == same_party && c.votes > target.votes)
            .last()
    };

    let internal_competitor = nearest_above(true).map(|c| InternalCompetitor {
        ballot_name: c.ballot_name.clone(),
        party: c.party.clone(),
        state: contest.state.clone(),
        slug: c.slug.clone(),
        votes: c.votes,
        vote_difference: c.votes - target.votes,
        position: c.position,
        elected: c.elected,
    });

    let external_competitor = nearest_above(false)
        .map(|c| external(contest, c, target, CompetitorKind::NearestAbove));

    let worst_elected_external = field
        .iter()
        .filter(|c| c.elected && c.party != target_party)
        .last()
        .map(|c| external(contest, c, target, CompetitorKind::WorstElected));

    Some(ContestAnalysis {
        year: contest.year,
        scope_name: contest.scope_name().unwrap_or_default().to_string(),
        state: contest.state.clone(),
        office: contest.office.clone(),
        round: contest.round,
        candidate: TargetStanding {
            ballot_name: target.ballot_name.clone(),
            name: target.name.clone(),
            party: target.party.clone(),
            votes: target.votes,
            position: target.position,
            elected: target.elected,
            status: target.status.clone(),
            in_cutoff_block: target.position <= block_size,
        },
        metrics: ContestMetrics {
            total_candidates: field.len(),
            seats,
            block_size,
            votes_at_cutoff,
            votes_at_block_edge,
        },
        internal_competitor,
        external_competitor,
        worst_elected_external,
        party_efficiency: party_efficiency(block),
        cutoff_block: block.to_vec(),
    })
}

fn external(
    contest: &ElectionContest,
    competitor: &RankedCandidate,
    target: &RankedCandidate,
    kind: CompetitorKind,
) -> ExternalCompetitor {
    let difference = competitor.votes - target.votes;
    ExternalCompetitor {
        ballot_name: competitor.ballot_name.clone(),
        party: competitor.party.clone(),
        state: contest.state.clone(),
        slug: competitor.slug.clone(),
        votes: competitor.votes,
        vote_difference: difference,
        position: competitor.position,
        kind,
        opportunity_score: difference,
    }
}

/// Per-party rollup of the cutoff block, most efficient first.
pub fn party_efficiency(block: &[RankedCandidate]) -> Vec<PartyEfficiency> {
    let mut parties: Vec<PartyEfficiency> = aggregate(block, |c| c.party.clone(), |c| c.votes)
        .into_iter()
        .map(|group| {
            let candidates = group.rows;
            let elected = block
                .iter()
                .filter(|c| c.elected && c.party == group.key)
                .count();
            PartyEfficiency {
                party: group.key,
                candidates_in_block: candidates,
                total_votes: group.total_votes,
                elected,
                mean_votes: rounded_mean(group.total_votes, candidates),
                efficiency: elected as f64 / candidates as f64,
            }
        })
        .collect();

    parties.sort_by(|a, b| {
        b.efficiency
            .partial_cmp(&a.efficiency)
            .unwrap_or(Ordering::Equal)
    });
    parties
}

/// Integer mean rounded half up.
fn rounded_mean(total: i64, count: usize) -> i64 {
    let count = count as i64;
    (total * 2 + count).div_euclid(count * 2)
}
