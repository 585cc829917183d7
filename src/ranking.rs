use std::cmp::Ordering;

use crate::ledger::StandingsLedger;
use crate::records::{RankedRow, StandingsRow};

/// Table order: points, goal difference, goals scored, all descending.
///
/// There is no further tie-break; callers rely on a stable sort to keep
/// exact ties in their original order.
pub fn compare_rows(a: &StandingsRow, b: &StandingsRow) -> Ordering {
    b.ranking_key().cmp(&a.ranking_key())
}

/// Sort rows into table order and number them 1..=n.
pub fn rank_rows(mut rows: Vec<StandingsRow>) -> Vec<RankedRow> {
    rows.sort_by(compare_rows);
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| RankedRow { rank: i + 1, row })
        .collect()
}

/// Final table for a ledger.
pub fn rank(ledger: &StandingsLedger) -> Vec<RankedRow> {
    rank_rows(ledger.rows().to_vec())
}
