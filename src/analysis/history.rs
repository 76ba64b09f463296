use super::aggregate::aggregate;
use crate::model::{ElectionContest, VoteRecord};
use std::collections::BTreeMap;

/// How many past elections are analyzed per candidate.
pub const DEFAULT_ELECTION_LIMIT: usize = 4;

/// A contest from the candidate's own history chosen for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedElection {
    pub contest: ElectionContest,
    /// Candidate's own votes in the contest, summed over zones.
    pub total_votes: i64,
}

/// Reduce a candidate's zone-level history to at most `limit` contests: the
/// highest-voted contest of each year, most recent years first.
pub fn select_elections(history: &[VoteRecord], limit: usize) -> Vec<SelectedElection> {
    let contests = aggregate(
        history.iter().map(|r| (ElectionContest::from_record(r), r)),
        |(contest, _)| contest.group_key(),
        |(_, r)| r.votes,
    );

    let mut by_year: BTreeMap<i32, SelectedElection> = BTreeMap::new();
    for group in contests {
        let (contest, _) = group.first;
        let candidate = SelectedElection {
            total_votes: group.total_votes,
            contest,
        };

        match by_year.get(&candidate.contest.year) {
            Some(existing) if existing.total_votes >= candidate.total_votes => {}
            _ => {
                by_year.insert(candidate.contest.year, candidate);
            }
        }
    }

    by_year.into_values().rev().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContestScope;

    fn row(year: i32, office: &str, municipality: &str, round: i32, votes: i64) -> VoteRecord {
        VoteRecord {
            candidate_id: 1,
            name: "JOANA LIMA".into(),
            ballot_name: "JOANA".into(),
            party: "PSOL".into(),
            municipality: Some(municipality.into()),
            state: "SP".into(),
            year,
            office: office.into(),
            round,
            votes,
            status: Some("SUPLENTE".into()),
        }
    }

    #[test]
    fn test_statewide_rows_sum_across_municipalities() {
        let history = vec![
            row(2022, "DEPUTADO ESTADUAL", "SAO PAULO", 1, 100),
            row(2022, "DEPUTADO ESTADUAL", "CAMPINAS", 1, 50),
            row(2022, "DEPUTADO ESTADUAL", "SAO PAULO", 1, 25),
        ];
        let selected = select_elections(&history, DEFAULT_ELECTION_LIMIT);
        assert_eq!(1, selected.len());
        assert_eq!(175, selected[0].total_votes);
        assert_eq!(ContestScope::Statewide, selected[0].contest.scope);
        assert_eq!(Some("SP"), selected[0].contest.scope_name());
    }

    #[test]
    fn test_keeps_best_contest_per_year() {
        let history = vec![
            row(2024, "VEREADOR", "SANTOS", 1, 300),
            row(2024, "VEREADOR", "GUARUJA", 1, 900),
            row(2024, "VEREADOR", "SANTOS", 1, 200),
        ];
        let selected = select_elections(&history, DEFAULT_ELECTION_LIMIT);
        assert_eq!(1, selected.len());
        assert_eq!(Some("GUARUJA"), selected[0].contest.scope_name());
        assert_eq!(900, selected[0].total_votes);
    }

    #[test]
    fn test_first_contest_wins_a_tie() {
        let history = vec![
            row(2020, "VEREADOR", "SANTOS", 1, 500),
            row(2020, "PREFEITO", "SANTOS", 1, 500),
        ];
        let selected = select_elections(&history, DEFAULT_ELECTION_LIMIT);
        assert_eq!("VEREADOR", selected[0].contest.office);
    }

    #[test]
    fn test_most_recent_years_first_and_limited() {
        let history: Vec<_> = [2010, 2022, 2014, 2018, 2012, 2020, 2016]
            .iter()
            .map(|&year| row(year, "DEPUTADO FEDERAL", "SANTOS", 1, 10))
            .collect();
        let selected = select_elections(&history, DEFAULT_ELECTION_LIMIT);
        assert_eq!(
            vec![2022, 2020, 2018, 2016],
            selected.iter().map(|s| s.contest.year).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_rounds_are_separate_contests() {
        let history = vec![
            row(2024, "PREFEITO", "SANTOS", 1, 1000),
            row(2024, "PREFEITO", "SANTOS", 2, 1500),
        ];
        let selected = select_elections(&history, DEFAULT_ELECTION_LIMIT);
        assert_eq!(1, selected.len());
        assert_eq!(2, selected[0].contest.round);
    }

    #[test]
    fn test_empty_history() {
        assert!(select_elections(&[], DEFAULT_ELECTION_LIMIT).is_empty());
    }
}
