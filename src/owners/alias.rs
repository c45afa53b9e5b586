//! Named groups of users referenced from ownership manifests.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Alias name to member-name set, loaded once per repository root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTable {
    #[serde(default)]
    pub aliases: BTreeMap<String, BTreeSet<String>>,
}

impl AliasTable {
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn members(&self, alias: &str) -> Option<&BTreeSet<String>> {
        self.aliases.get(alias)
    }

    /// Replaces every alias name in `names` by its members.
    ///
    /// Names that are not aliases pass through unchanged. Expansion is one
    /// level deep: an alias listed inside another alias is kept as a name.
    pub fn expand<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for name in names {
            match self.aliases.get(name) {
                Some(members) => out.extend(members.iter().cloned()),
                None => {
                    out.insert(name.clone());
                }
            }
        }
        out
    }
}

impl<K, M, I> FromIterator<(K, I)> for AliasTable
where
    K: Into<String>,
    M: Into<String>,
    I: IntoIterator<Item = M>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        AliasTable {
            aliases: iter
                .into_iter()
                .map(|(k, members)| (k.into(), members.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }
}
