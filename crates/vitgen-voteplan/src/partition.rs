use tracing::debug;

use vitgen_core::constants::{MAX_PLAN_SIZE, MIN_PLAN_SIZE};
use vitgen_core::error::VitgenError;
use vitgen_core::proposal::Proposal;
use vitgen_core::types::PayloadType;

/// Proposals destined for one vote plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanBatch {
    /// Global plan index, contiguous from 0 across payload types.
    pub index: usize,
    pub payload: PayloadType,
    /// Positions in the proposal slice, in dataset order.
    pub members: Vec<usize>,
}

pub fn validate_plan_size(max_plan_size: usize) -> Result<(), VitgenError> {
    if !(MIN_PLAN_SIZE..=MAX_PLAN_SIZE).contains(&max_plan_size) {
        return Err(VitgenError::InvalidPlanSize(max_plan_size));
    }
    Ok(())
}

/// `ceil(n / max_plan_size)`.
pub fn plans_needed(n: usize, max_plan_size: usize) -> usize {
    n.div_ceil(max_plan_size)
}

/// Split `proposals` into batches.
///
/// Public proposals come first, then private ones. Within a payload type the
/// dataset order is kept and the i-th proposal lands in batch
/// `i / max_plan_size` after the batches already created.
pub fn partition(proposals: &[Proposal], max_plan_size: usize) -> Result<Vec<PlanBatch>, VitgenError> {
    validate_plan_size(max_plan_size)?;

    let mut batches: Vec<PlanBatch> = Vec::new();
    for payload in PayloadType::ALL {
        let group: Vec<usize> = proposals
            .iter()
            .enumerate()
            .filter(|(_, p)| p.payload() == payload)
            .map(|(pos, _)| pos)
            .collect();

        let created = batches.len();
        for (n, chunk) in group.chunks(max_plan_size).enumerate() {
            batches.push(PlanBatch {
                index: created + n,
                payload,
                members: chunk.to_vec(),
            });
        }
        debug!(
            %payload,
            proposals = group.len(),
            plans = plans_needed(group.len(), max_plan_size),
            "payload group partitioned"
        );
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitgen_core::proposal::ChainProposal;

    fn proposals(public: usize, private: usize) -> Vec<Proposal> {
        // interleave so grouping has to pull members apart
        let mut out = Vec::new();
        let total = public + private;
        let (mut pu, mut pr) = (0, 0);
        for i in 0..total {
            let payload = if (i % 2 == 1 && pr < private) || pu == public {
                pr += 1;
                PayloadType::Private
            } else {
                pu += 1;
                PayloadType::Public
            };
            out.push(Proposal {
                internal_id: i as u64 + 1,
                category: Default::default(),
                details: Default::default(),
                proposer: Default::default(),
                chain: ChainProposal {
                    payload,
                    ..Default::default()
                },
            });
        }
        out
    }

    #[test]
    fn plans_needed_is_ceiling_division() {
        assert_eq!(plans_needed(0, 255), 0);
        assert_eq!(plans_needed(1, 255), 1);
        assert_eq!(plans_needed(255, 255), 1);
        assert_eq!(plans_needed(256, 255), 2);
        assert_eq!(plans_needed(300, 254), 2);
    }

    #[test]
    fn batches_are_bounded_and_typed() {
        let ps = proposals(300, 10);
        let batches = partition(&ps, 254).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(
            batches.iter().map(|b| b.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(batches[0].members.len(), 254);
        assert_eq!(batches[1].members.len(), 46);
        assert_eq!(batches[2].members.len(), 10);
        assert_eq!(batches[2].payload, PayloadType::Private);
        for b in &batches {
            assert!(b.members.iter().all(|&m| ps[m].payload() == b.payload));
        }
    }

    #[test]
    fn concatenation_keeps_dataset_order() {
        let ps = proposals(7, 5);
        let batches = partition(&ps, 3).unwrap();
        for payload in PayloadType::ALL {
            let joined: Vec<usize> = batches
                .iter()
                .filter(|b| b.payload == payload)
                .flat_map(|b| b.members.iter().copied())
                .collect();
            let expected: Vec<usize> = (0..ps.len()).filter(|&i| ps[i].payload() == payload).collect();
            assert_eq!(joined, expected);
        }
    }

    #[test]
    fn empty_input_creates_no_plans() {
        assert!(partition(&[], 255).unwrap().is_empty());
    }

    #[test]
    fn plan_size_limits() {
        assert!(partition(&[], 0).is_err());
        assert!(partition(&[], 257).is_err());
        assert!(partition(&proposals(256, 0), 256).unwrap().len() == 1);
    }
}
