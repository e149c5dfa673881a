//! Content identifiers for proposals.

use std::collections::HashMap;

use tracing::debug;

use vitgen_core::error::VitgenError;
use vitgen_core::proposal::Proposal;
use vitgen_core::types::PayloadType;

use crate::hash::blake3_hex;

/// `hex(blake3(proposal_id ∥ internal_id ∥ payload))`, with the internal id
/// rendered in decimal.
pub fn external_id(proposal_id: &str, internal_id: u64, payload: PayloadType) -> String {
    blake3_hex(&[
        proposal_id.as_bytes(),
        internal_id.to_string().as_bytes(),
        payload.as_str().as_bytes(),
    ])
}

/// Give every proposal its external id.
///
/// A proposal that already carries the derived value is left alone; one that
/// carries anything else, or two proposals deriving the same value, abort the run.
pub fn assign_external_ids(proposals: &mut [Proposal]) -> Result<(), VitgenError> {
    let mut seen: HashMap<String, u64> = HashMap::with_capacity(proposals.len());

    for p in proposals.iter_mut() {
        let id = external_id(&p.details.proposal_id, p.internal_id, p.payload());

        match p.chain.external_id.as_deref() {
            Some(existing) if existing != id => {
                return Err(VitgenError::ExternalIdReassigned {
                    internal_id: p.internal_id,
                    existing: existing.to_string(),
                });
            }
            _ => {}
        }

        if let Some(&first) = seen.get(&id) {
            return Err(VitgenError::DuplicateExternalId {
                external_id: id,
                first,
                second: p.internal_id,
            });
        }
        seen.insert(id.clone(), p.internal_id);
        p.chain.external_id = Some(id);
    }

    debug!(count = proposals.len(), "external ids assigned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitgen_core::proposal::{ChainProposal, ProposalDetails};

    fn proposal(internal_id: u64, proposal_id: &str, payload: PayloadType) -> Proposal {
        Proposal {
            internal_id,
            category: Default::default(),
            details: ProposalDetails {
                proposal_id: proposal_id.into(),
                ..Default::default()
            },
            proposer: Default::default(),
            chain: ChainProposal {
                payload,
                ..Default::default()
            },
        }
    }

    #[test]
    fn deterministic_and_sensitive_to_every_part() {
        let a = external_id("p-1", 1, PayloadType::Public);
        assert_eq!(a, external_id("p-1", 1, PayloadType::Public));
        assert_ne!(a, external_id("p-2", 1, PayloadType::Public));
        assert_ne!(a, external_id("p-1", 2, PayloadType::Public));
        assert_ne!(a, external_id("p-1", 1, PayloadType::Private));
    }

    #[test]
    fn assigning_twice_is_a_no_op() {
        let mut ps = vec![
            proposal(1, "p-1", PayloadType::Public),
            proposal(2, "p-2", PayloadType::Private),
        ];
        assign_external_ids(&mut ps).unwrap();
        let first: Vec<_> = ps.iter().map(|p| p.external_id().unwrap().to_string()).collect();
        assign_external_ids(&mut ps).unwrap();
        let second: Vec<_> = ps.iter().map(|p| p.external_id().unwrap().to_string()).collect();
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn foreign_value_is_not_overwritten() {
        let mut ps = vec![proposal(1, "p-1", PayloadType::Public)];
        ps[0].chain.external_id = Some("deadbeef".into());
        let err = assign_external_ids(&mut ps).unwrap_err();
        assert!(matches!(err, VitgenError::ExternalIdReassigned { internal_id: 1, .. }));
    }

    #[test]
    fn colliding_rows_are_rejected() {
        // same proposal id, internal id and payload on two rows
        let mut ps = vec![
            proposal(3, "dup", PayloadType::Public),
            proposal(3, "dup", PayloadType::Public),
        ];
        let err = assign_external_ids(&mut ps).unwrap_err();
        assert_eq!(err.category(), vitgen_core::ErrorCategory::DataIntegrity);
    }
}
