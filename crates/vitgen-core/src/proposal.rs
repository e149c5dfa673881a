use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Lovelace, PayloadType, VoteAction};

/// One proposal row as loaded from the election dataset.
///
/// The loader creates it; the identity hasher fills `chain.external_id`;
/// the cross-linker fills `chain.index` and `chain.plan_id`. Records are never
/// removed during a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Stable ordering key, unique within the dataset.
    pub internal_id: u64,
    #[serde(rename = "proposal_category")]
    pub category: ProposalCategory,
    #[serde(flatten)]
    pub details: ProposalDetails,
    pub proposer: Proposer,
    #[serde(flatten)]
    pub chain: ChainProposal,
}

impl Proposal {
    pub fn payload(&self) -> PayloadType {
        self.chain.payload
    }

    pub fn external_id(&self) -> Option<&str> {
        self.chain.external_id.as_deref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalCategory {
    #[serde(default)]
    pub category_id: String,
    pub category_name: String,
    #[serde(default, rename = "category_description")]
    pub category_desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalDetails {
    pub proposal_id: String,
    pub proposal_title: String,
    pub proposal_summary: String,
    pub proposal_problem: String,
    pub proposal_solution: String,
    pub proposal_url: String,
    pub proposal_files_url: String,
    pub proposal_public_key: String,
    pub proposal_funds: Lovelace,
    /// Impact score scaled by 100 (4.25 → 425).
    pub proposal_impact_score: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Proposer {
    pub proposer_name: String,
    pub proposer_email: String,
    pub proposer_url: String,
    pub proposer_relevant_experience: String,
}

/// Ledger-facing half of a proposal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainProposal {
    /// Content identifier; set once by the identity hasher.
    #[serde(rename = "chain_proposal_id", default)]
    pub external_id: Option<String>,
    /// Position inside the owning vote plan; set once by the cross-linker.
    #[serde(rename = "chain_proposal_index", default)]
    pub index: Option<u8>,
    #[serde(rename = "chain_vote_options")]
    pub vote_options: VoteOptions,
    #[serde(rename = "chain_vote_type", default)]
    pub payload: PayloadType,
    #[serde(rename = "chain_vote_action", default)]
    pub vote_action: VoteAction,
    /// Foreign key into the current fund's vote plan summaries.
    #[serde(skip)]
    pub plan_id: Option<String>,
}

// ── VoteOptions ──────────────────────────────────────────────────────────────

/// Ordered set of named choices. The position of a name is its option index.
///
/// Serialized as `{"name": index, ...}` in index order; parsed from the
/// comma separated form used by the tabular inputs (`"blank,yes,no"`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteOptions(Vec<String>);

impl VoteOptions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn parse_list(list: &str) -> Self {
        if list.trim().is_empty() {
            return Self::default();
        }
        Self::new(list.split(',').map(str::trim))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn to_list(&self) -> String {
        self.0.join(",")
    }
}

impl Serialize for VoteOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, name) in self.0.iter().enumerate() {
            map.serialize_entry(name, &i)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VoteOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = VoteOptions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of option name to option index")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(usize, String)> = Vec::new();
                while let Some((name, index)) = access.next_entry::<String, usize>()? {
                    entries.push((index, name));
                }
                entries.sort();
                Ok(VoteOptions(entries.into_iter().map(|(_, n)| n).collect()))
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}
