use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// One row of `votacao_candidato_munzona`: a candidate's nominal votes in a
/// single municipality/zone for one round of one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    #[serde(rename = "sq_candidato", deserialize_with = "lenient_i64")]
    pub candidate_id: i64,
    #[serde(rename = "nm_candidato")]
    pub name: String,
    #[serde(rename = "nm_urna_candidato")]
    pub ballot_name: String,
    #[serde(rename = "sg_partido")]
    pub party: String,
    #[serde(rename = "nm_municipio", default)]
    pub municipality: Option<String>,
    #[serde(rename = "sg_uf")]
    pub state: String,
    #[serde(rename = "ano_eleicao", deserialize_with = "lenient_i32")]
    pub year: i32,
    #[serde(rename = "ds_cargo")]
    pub office: String,
    #[serde(rename = "nr_turno", deserialize_with = "lenient_i32")]
    pub round: i32,
    #[serde(rename = "qt_votos_nominais", deserialize_with = "lenient_i64")]
    pub votes: i64,
    #[serde(rename = "ds_sit_tot_turno", default)]
    pub status: Option<String>,
}

/// Column list requested from PostgREST for every vote-row fetch.
pub const VOTE_RECORD_COLUMNS: &str = "sq_candidato,nm_candidato,nm_urna_candidato,sg_partido,\
nm_municipio,sg_uf,ano_eleicao,ds_cargo,nr_turno,qt_votos_nominais,ds_sit_tot_turno";

/// PostgREST serializes `bigint`/`numeric` columns either as JSON numbers or
/// as strings depending on the view definition. Both are accepted; anything
/// else is a decode error.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct IntVisitor;

    impl<'de> de::Visitor<'de> for IntVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer or a string holding an integer")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("integer out of range: {}", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if !(v.is_finite() && v.fract() == 0.0) {
                return Err(E::custom(format!("expected a whole number, got {}", v)));
            }
            // i64::MAX is not representable as f64; the cast rounds up to 2^63.
            if v < i64::MIN as f64 || v >= i64::MAX as f64 {
                return Err(E::custom(format!("integer out of range: {}", v)));
            }
            Ok(v as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("not an integer: {:?}", v)))
        }
    }

    deserializer.deserialize_any(IntVisitor)
}

pub(crate) fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_i64(deserializer)?;
    i32::try_from(value).map_err(|_| de::Error::custom(format!("integer out of range: {}", value)))
}
