//! The single shared aggregate merger.
//!
//! Settled rollup rows and recomputed partial-day rows are both [`AggRow`]s;
//! merging is pure summation over a caller-chosen grouping key. Correctness
//! against double counting rests entirely on the date partitioning done by
//! the pipeline — the merger never subtracts, dedupes, or prefers one source.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{AggRow, Counts};

/// Fold rows into `key -> summed counts`. Commutative over input order, so
/// concurrent sub-fetches can feed it in any order. A rollup row and a
/// partial-day row landing on the same key sum additively.
pub fn merge_rows<'a, K, I, F>(rows: I, mut key_fn: F) -> HashMap<K, Counts>
where
    K: Eq + Hash,
    I: IntoIterator<Item = &'a AggRow>,
    F: FnMut(&AggRow) -> K,
{
    let mut merged: HashMap<K, Counts> = HashMap::new();
    for row in rows {
        *merged.entry(key_fn(row)).or_default() += row.counts;
    }
    merged
}

/// Sum a set of already-merged counts.
#[must_use]
pub fn total_counts<'a, I>(counts: I) -> Counts
where
    I: IntoIterator<Item = &'a Counts>,
{
    let mut total = Counts::ZERO;
    for c in counts {
        total += *c;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityKey;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().expect("date literal")
    }

    fn row(entity: EntityKey, platform: &str, day: &str, mentions: i64, citations: i64) -> AggRow {
        AggRow {
            entity,
            platform: platform.to_string(),
            region_id: 1,
            topic_id: 1,
            day: d(day),
            counts: Counts::new(mentions, citations),
        }
    }

    #[test]
    fn sums_across_days_for_same_entity() {
        let rows = vec![
            row(EntityKey::Brand, "chatgpt", "2025-06-01", 3, 1),
            row(EntityKey::Brand, "chatgpt", "2025-06-02", 4, 0),
            row(EntityKey::Competitor(9), "chatgpt", "2025-06-01", 2, 2),
        ];
        let merged = merge_rows(&rows, |r| r.entity);
        assert_eq!(merged[&EntityKey::Brand], Counts::new(7, 1));
        assert_eq!(merged[&EntityKey::Competitor(9)], Counts::new(2, 2));
    }

    #[test]
    fn same_key_from_both_sources_sums_additively() {
        // A settled row and a recomputed row for the same (entity, day) must
        // sum, not replace each other.
        let rows = vec![
            row(EntityKey::Brand, "chatgpt", "2025-06-07", 5, 0),
            row(EntityKey::Brand, "chatgpt", "2025-06-07", 2, 1),
        ];
        let merged = merge_rows(&rows, |r| (r.entity, r.day));
        assert_eq!(
            merged[&(EntityKey::Brand, d("2025-06-07"))],
            Counts::new(7, 1)
        );
    }

    #[test]
    fn merge_is_commutative_over_input_order() {
        let mut rows = vec![
            row(EntityKey::Brand, "chatgpt", "2025-06-01", 3, 1),
            row(EntityKey::Competitor(2), "perplexity", "2025-06-02", 1, 0),
            row(EntityKey::Brand, "perplexity", "2025-06-03", 2, 4),
        ];
        let forward = merge_rows(&rows, |r| (r.entity, r.platform.clone()));
        rows.reverse();
        let backward = merge_rows(&rows, |r| (r.entity, r.platform.clone()));
        assert_eq!(forward, backward);
    }

    #[test]
    fn grouping_key_is_caller_chosen() {
        let rows = vec![
            row(EntityKey::Brand, "chatgpt", "2025-06-01", 3, 0),
            row(EntityKey::Competitor(1), "chatgpt", "2025-06-01", 1, 0),
            row(EntityKey::Brand, "perplexity", "2025-06-01", 2, 0),
        ];
        let by_platform = merge_rows(&rows, |r| r.platform.clone());
        assert_eq!(by_platform["chatgpt"], Counts::new(4, 0));
        assert_eq!(by_platform["perplexity"], Counts::new(2, 0));
    }

    #[test]
    fn empty_input_merges_to_empty_map() {
        let rows: Vec<AggRow> = Vec::new();
        let merged = merge_rows(&rows, |r| r.entity);
        assert!(merged.is_empty());
    }

    #[test]
    fn total_counts_sums_all_values() {
        let rows = vec![
            row(EntityKey::Brand, "chatgpt", "2025-06-01", 3, 1),
            row(EntityKey::Competitor(2), "chatgpt", "2025-06-01", 4, 2),
        ];
        let merged = merge_rows(&rows, |r| r.entity);
        let total = total_counts(merged.values());
        assert_eq!(total, Counts::new(7, 3));
    }
}
