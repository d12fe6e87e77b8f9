use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::model::{CanonicalTransaction, MatchPair};

/// `tx_id` → input position of the first record on one side that was
/// rejected before matching (failed mapping or normalization).
pub type RejectedIds = HashMap<String, usize>;

/// Pair internal and gateway transactions by exact `tx_id`.
///
/// Output order: every internal record in input order (paired, internal-only,
/// or duplicate), then the remaining gateway records in input order
/// (gateway-only or duplicate). The first occurrence of a `tx_id` within a
/// side is the one that pairs; later occurrences come out as
/// [`MatchPair::Duplicate`] and never pair.
pub fn match_transactions(
    internal: Vec<CanonicalTransaction>,
    gateway: Vec<CanonicalTransaction>,
) -> Vec<MatchPair> {
    match_with_rejected(internal, gateway, &RejectedIds::new(), &RejectedIds::new())
}

/// [`match_transactions`], counting rejected records as occurrences.
///
/// When the first occurrence of a `tx_id` was rejected, it still holds the
/// first slot: every later valid occurrence on that side is a
/// [`MatchPair::Duplicate`], and the other side's record for that id stays
/// one-sided.
pub fn match_with_rejected(
    internal: Vec<CanonicalTransaction>,
    gateway: Vec<CanonicalTransaction>,
    rejected_internal: &RejectedIds,
    rejected_gateway: &RejectedIds,
) -> Vec<MatchPair> {
    let mut pairs = Vec::with_capacity(internal.len() + gateway.len());

    // Gateway slots in input order; `true` marks a repeat occurrence.
    let mut first_index: HashMap<String, usize> = HashMap::with_capacity(gateway.len());
    let mut slots: Vec<(bool, Option<CanonicalTransaction>)> = Vec::with_capacity(gateway.len());
    for (i, tx) in gateway.into_iter().enumerate() {
        let repeat = rejected_before(rejected_gateway, &tx)
            || match first_index.entry(tx.tx_id.clone()) {
                Entry::Occupied(_) => true,
                Entry::Vacant(v) => {
                    v.insert(i);
                    false
                }
            };
        slots.push((repeat, Some(tx)));
    }

    let mut internal_seen: HashSet<String> = HashSet::with_capacity(internal.len());
    for tx in internal {
        if rejected_before(rejected_internal, &tx) || !internal_seen.insert(tx.tx_id.clone()) {
            log::warn!("duplicate tx_id '{}' on internal side at position {}", tx.tx_id, tx.position);
            pairs.push(MatchPair::Duplicate(tx));
            continue;
        }
        let counterpart = first_index
            .get(&tx.tx_id)
            .and_then(|&i| slots[i].1.take());
        match counterpart {
            Some(gateway) => pairs.push(MatchPair::Both {
                internal: tx,
                gateway,
            }),
            None => pairs.push(MatchPair::InternalOnly(tx)),
        }
    }

    for (repeat, slot) in slots {
        let Some(tx) = slot else { continue };
        if repeat {
            log::warn!("duplicate tx_id '{}' on gateway side at position {}", tx.tx_id, tx.position);
            pairs.push(MatchPair::Duplicate(tx));
        } else {
            pairs.push(MatchPair::GatewayOnly(tx));
        }
    }

    pairs
}

fn rejected_before(rejected: &RejectedIds, tx: &CanonicalTransaction) -> bool {
    rejected.get(&tx.tx_id).is_some_and(|&position| position < tx.position)
}
