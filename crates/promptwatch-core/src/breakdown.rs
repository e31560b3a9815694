//! Entity breakdown composition: merged counts plus the entity roster in,
//! ranked percentage shares out.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Counts, EntityKey};

/// An active competitor as the roster presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitorRef {
    pub id: i64,
    pub name: String,
}

/// The entities a breakdown may present: the tracked brand plus the active
/// competitors. Inactive competitors never appear here, which is what keeps
/// their historical rows out of presented results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRoster {
    pub brand_name: String,
    pub competitors: Vec<CompetitorRef>,
}

/// One ranked entry in an entity breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityShare {
    #[serde(flatten)]
    pub entity: EntityKey,
    pub name: String,
    pub mentions: i64,
    pub citations: i64,
    pub percentage: f64,
}

/// `100 * part / total`, 0 when the total is not positive. Never divides by
/// zero and never produces NaN.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    100.0 * part as f64 / total as f64
}

/// Compose the ranked breakdown for one merged mapping.
///
/// The percentage base is the mention total over roster entities only, so
/// shares always sum to ~100 for a non-zero total. The brand is always
/// present even with zero counts; competitors with zero mentions are
/// omitted. Sorted by percentage descending, ties broken by name so the
/// ordering is deterministic.
#[must_use]
pub fn compose_breakdown(
    counts: &HashMap<EntityKey, Counts>,
    roster: &EntityRoster,
) -> Vec<EntityShare> {
    let lookup = |key: EntityKey| counts.get(&key).copied().unwrap_or(Counts::ZERO);

    let brand = lookup(EntityKey::Brand);
    let competitors: Vec<(&CompetitorRef, Counts)> = roster
        .competitors
        .iter()
        .map(|c| (c, lookup(EntityKey::Competitor(c.id))))
        .collect();

    let total_mentions =
        brand.mentions + competitors.iter().map(|(_, c)| c.mentions).sum::<i64>();

    let mut shares = Vec::with_capacity(competitors.len() + 1);
    shares.push(EntityShare {
        entity: EntityKey::Brand,
        name: roster.brand_name.clone(),
        mentions: brand.mentions,
        citations: brand.citations,
        percentage: percentage(brand.mentions, total_mentions),
    });
    for (competitor, c) in competitors {
        if c.mentions == 0 {
            continue;
        }
        shares.push(EntityShare {
            entity: EntityKey::Competitor(competitor.id),
            name: competitor.name.clone(),
            mentions: c.mentions,
            citations: c.citations,
            percentage: percentage(c.mentions, total_mentions),
        });
    }

    shares.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    shares
}
