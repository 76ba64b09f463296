use crate::analysis::aggregate::GroupKey;
use crate::model::vote::VoteRecord;
use serde::{Deserialize, Serialize};

/// Offices whose contests are decided statewide. Matched as substrings of the
/// upper-cased `ds_cargo`.
pub const STATEWIDE_OFFICES: [&str; 5] = [
    "DEPUTADO FEDERAL",
    "DEPUTADO ESTADUAL",
    "SENADOR",
    "GOVERNADOR",
    "PRESIDENTE",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestScope {
    Statewide,
    Municipal,
}

impl ContestScope {
    pub fn for_office(office: &str) -> ContestScope {
        let office = office.to_uppercase();
        if STATEWIDE_OFFICES.iter().any(|o| office.contains(o)) {
            ContestScope::Statewide
        } else {
            ContestScope::Municipal
        }
    }
}

/// One office race in one year and round at one geographic scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElectionContest {
    pub scope: ContestScope,
    pub state: String,
    pub municipality: Option<String>,
    pub year: i32,
    pub office: String,
    pub round: i32,
}

impl ElectionContest {
    pub fn from_record(record: &VoteRecord) -> ElectionContest {
        let scope = ContestScope::for_office(&record.office);
        ElectionContest {
            scope,
            state: record.state.clone(),
            municipality: match scope {
                ContestScope::Statewide => None,
                ContestScope::Municipal => record.municipality.clone(),
            },
            year: record.year,
            office: record.office.clone(),
            round: record.round,
        }
    }

    pub fn is_statewide(&self) -> bool {
        self.scope == ContestScope::Statewide
    }

    /// The state code for statewide contests, the municipality otherwise.
    pub fn scope_name(&self) -> Option<&str> {
        match self.scope {
            ContestScope::Statewide => Some(&self.state),
            ContestScope::Municipal => self.municipality.as_deref(),
        }
    }

    pub fn group_key(&self) -> GroupKey {
        let year = self.year.to_string();
        let round = self.round.to_string();
        GroupKey::from_parts([
            self.scope_name(),
            Some(year.as_str()),
            Some(self.office.as_str()),
            Some(round.as_str()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(office: &str, municipality: Option<&str>) -> VoteRecord {
        VoteRecord {
            candidate_id: 1,
            name: "MARIA".into(),
            ballot_name: "MARIA".into(),
            party: "PSB".into(),
            municipality: municipality.map(String::from),
            state: "PE".into(),
            year: 2024,
            office: office.into(),
            round: 1,
            votes: 10,
            status: None,
        }
    }

    #[test]
    fn test_office_scope() {
        assert_eq!(ContestScope::Statewide, ContestScope::for_office("Deputado Federal"));
        assert_eq!(ContestScope::Statewide, ContestScope::for_office("SENADOR"));
        assert_eq!(ContestScope::Statewide, ContestScope::for_office("1º SUPLENTE SENADOR"));
        assert_eq!(ContestScope::Municipal, ContestScope::for_office("VEREADOR"));
        assert_eq!(ContestScope::Municipal, ContestScope::for_office("PREFEITO"));
    }

    #[test]
    fn test_statewide_contest_ignores_municipality() {
        let a = ElectionContest::from_record(&record("DEPUTADO ESTADUAL", Some("RECIFE")));
        let b = ElectionContest::from_record(&record("DEPUTADO ESTADUAL", Some("OLINDA")));
        assert_eq!(a, b);
        assert_eq!(Some("PE"), a.scope_name());
        assert_eq!("PE|2024|DEPUTADO ESTADUAL|1", a.group_key().as_str());
    }

    #[test]
    fn test_municipal_contest_keyed_by_municipality() {
        let a = ElectionContest::from_record(&record("VEREADOR", Some("RECIFE")));
        let b = ElectionContest::from_record(&record("VEREADOR", Some("OLINDA")));
        assert_ne!(a.group_key(), b.group_key());
        assert_eq!(Some("RECIFE"), a.scope_name());
    }

    #[test]
    fn test_missing_municipality_is_distinct_token() {
        let contest = ElectionContest::from_record(&record("VEREADOR", None));
        assert_eq!(None, contest.scope_name());
        assert_eq!("undefined|2024|VEREADOR|1", contest.group_key().as_str());
    }
}
