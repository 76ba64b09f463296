use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Composite grouping key built from optional parts. Missing parts are kept
/// as the literal `undefined` so they never collapse into a present value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    pub const MISSING: &'static str = "undefined";

    pub fn from_parts<'a, I>(parts: I) -> GroupKey
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let joined = parts
            .into_iter()
            .map(|part| part.unwrap_or(Self::MISSING))
            .collect::<Vec<_>>()
            .join("|");
        GroupKey(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rows sharing one key, summed.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<K, T> {
    pub key: K,
    /// First row seen for the key; carries the descriptive fields.
    pub first: T,
    pub total_votes: i64,
    pub rows: usize,
}

/// Collapse `items` into one [`Aggregate`] per distinct key, summing the value
/// returned by `votes`. Output keeps first-encounter order of the keys.
pub fn aggregate<T, K, KF, VF>(
    items: impl IntoIterator<Item = T>,
    mut key: KF,
    mut votes: VF,
) -> Vec<Aggregate<K, T>>
where
    K: Eq + Hash + Clone,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> i64,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Aggregate<K, T>> = Vec::new();

    for item in items {
        let k = key(&item);
        let v = votes(&item);
        match index.get(&k) {
            Some(&i) => {
                let group = &mut groups[i];
                group.total_votes += v;
                group.rows += 1;
            }
            None => {
                index.insert(k.clone(), groups.len());
                groups.push(Aggregate {
                    key: k,
                    first: item,
                    total_votes: v,
                    rows: 1,
                });
            }
        }
    }

    groups
}
