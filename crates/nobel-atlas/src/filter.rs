//! Restrict laureates to those who appear on at least one prize

use crate::{LaureateRecord, PrizeRecord};
use std::collections::HashSet;
use tracing::info;

/// Every laureate id referenced by any prize
pub fn prize_laureate_ids(prizes: &[PrizeRecord]) -> HashSet<&str> {
    prizes
        .iter()
        .flat_map(|prize| prize.laureates.iter())
        .filter_map(|laureate| laureate.id.as_deref())
        .collect()
}

/// Keep laureates whose id is referenced by a prize, preserving input order.
///
/// A laureate without an id never matches.
pub fn filter_laureates(
    laureates: Vec<LaureateRecord>,
    prizes: &[PrizeRecord],
) -> Vec<LaureateRecord> {
    let ids = prize_laureate_ids(prizes);
    let total = laureates.len();

    let kept: Vec<LaureateRecord> = laureates
        .into_iter()
        .filter(|l| l.id.as_deref().is_some_and(|id| ids.contains(id)))
        .collect();

    info!(
        "Kept {} of {} laureates ({} ids referenced by prizes)",
        kept.len(),
        total,
        ids.len()
    );

    kept
}
