use super::{CandidateMatch, ElectoralSource, Result, SourceError};
use crate::model::vote::VOTE_RECORD_COLUMNS;
use crate::model::{ContestScope, ElectionContest, VoteRecord};
use crate::slug::{distinctive_words, CandidateSlug};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const VOTES_RESOURCE: &str = "votacao_candidato_munzona";
const CANDIDATES_VIEW: &str = "mv_votos_candidato";
const SLUG_RPC: &str = "rpc/buscar_candidato_por_slug";
const MATCH_COLUMNS: &str = "sq_candidato,nm_urna_candidato,nm_candidato,sg_partido,\
    ano_eleicao,ds_cargo,nr_turno,ds_sit_tot_turno,total_votos,municipios_votados";

/// A PostgREST request: resource path plus query-string filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    pub resource: &'static str,
    pub params: Vec<(&'static str, String)>,
}

/// [`ElectoralSource`] backed by the TSE PostgREST API.
#[derive(Debug, Clone)]
pub struct PostgrestSource {
    client: Client,
    base_url: String,
}

impl PostgrestSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, query.resource);
        debug!(resource = query.resource, params = ?query.params, "PostgREST request");

        let response = self.client.get(&url).query(&query.params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                resource: query.resource.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| SourceError::Decode {
            resource: query.resource.to_string(),
            source,
        })
    }
}

/// Candidate lookups in the order they are tried.
pub(crate) fn resolution_queries(slug: &CandidateSlug) -> Vec<Query> {
    let uf = format!("eq.{}", slug.uf);

    let mut queries = vec![
        Query {
            resource: SLUG_RPC,
            params: vec![
                ("p_uf", slug.uf.clone()),
                ("p_nome_slug", slug.full_name.clone()),
            ],
        },
        Query {
            resource: CANDIDATES_VIEW,
            params: vec![
                ("sg_uf", uf.clone()),
                ("nm_candidato", format!("ilike.*{}*", slug.full_name)),
                ("select", MATCH_COLUMNS.to_string()),
                ("order", "ano_eleicao.desc".to_string()),
            ],
        },
    ];

    let words = distinctive_words(&slug.name_slug);
    if !words.is_empty() {
        queries.push(Query {
            resource: CANDIDATES_VIEW,
            params: vec![
                ("sg_uf", uf.clone()),
                ("nm_urna_candidato", format!("ilike.*{}*", words.join(" "))),
                ("select", MATCH_COLUMNS.to_string()),
                ("order", "ano_eleicao.desc".to_string()),
            ],
        });
    }

    let names: Vec<&str> = slug
        .full_name
        .split(' ')
        .filter(|p| p.chars().count() >= 3)
        .collect();
    if names.len() >= 2 {
        let (first, last) = (names[0], names[names.len() - 1]);
        queries.push(Query {
            resource: CANDIDATES_VIEW,
            params: vec![
                ("sg_uf", uf),
                ("nm_candidato", format!("ilike.*{}*{}*", first, last)),
                ("select", MATCH_COLUMNS.to_string()),
                ("order", "ano_eleicao.desc".to_string()),
            ],
        });
    }

    queries
}

pub(crate) fn candidate_votes_query(candidate_ids: &[i64]) -> Query {
    let ids = candidate_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");

    Query {
        resource: VOTES_RESOURCE,
        params: vec![
            ("sq_candidato", format!("in.({})", ids)),
            ("select", VOTE_RECORD_COLUMNS.to_string()),
            ("order", "ano_eleicao.desc".to_string()),
        ],
    }
}

pub(crate) fn contest_votes_query(contest: &ElectionContest) -> Result<Query> {
    let mut params = vec![("sg_uf", format!("eq.{}", contest.state))];

    if contest.scope == ContestScope::Municipal {
        let municipality = contest.municipality.as_ref().ok_or_else(|| {
            SourceError::Unqueryable(format!(
                "{} {} in {} has no municipality",
                contest.office, contest.year, contest.state
            ))
        })?;
        params.push(("nm_municipio", format!("eq.{}", municipality)));
    }

    params.extend([
        ("ano_eleicao", format!("eq.{}", contest.year)),
        ("ds_cargo", format!("eq.{}", contest.office)),
        ("nr_turno", format!("eq.{}", contest.round)),
        ("select", VOTE_RECORD_COLUMNS.to_string()),
    ]);

    Ok(Query {
        resource: VOTES_RESOURCE,
        params,
    })
}

impl ElectoralSource for PostgrestSource {
    async fn resolve_candidate(&self, slug: &CandidateSlug) -> Result<Vec<CandidateMatch>> {
        for query in resolution_queries(slug) {
            match self.fetch::<CandidateMatch>(&query).await {
                Ok(matches) if !matches.is_empty() => return Ok(matches),
                Ok(_) => {}
                Err(SourceError::Status { status, resource }) => {
                    warn!(status, %resource, "candidate lookup strategy failed, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Vec::new())
    }

    async fn votes_for_candidates(&self, candidate_ids: &[i64]) -> Result<Vec<VoteRecord>> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch(&candidate_votes_query(candidate_ids)).await
    }

    async fn votes_for_contest(&self, contest: &ElectionContest) -> Result<Vec<VoteRecord>> {
        let query = contest_votes_query(contest)?;
        self.fetch(&query).await
    }
}
