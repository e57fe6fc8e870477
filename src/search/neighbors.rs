//! Frozen-order similarity ranking around a focal item
//!
//! The order is computed once per focal item and then held fixed: later
//! refreshes re-score every neighbor but never re-sort, so a live display does
//! not jostle while vectors are being edited.

use crate::math::cosine;
use crate::model::{Item, ItemId};
use log::trace;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Neighbors shown when no limit is configured
pub const DEFAULT_NEIGHBOR_LIMIT: usize = 12;

/// Score change that counts as movement rather than float noise
pub const DEFAULT_TREND_EPSILON: f64 = 0.002;

/// Direction a neighbor's score moved since the previous refresh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Same,
}

impl Trend {
    fn of(delta: f64, epsilon: f64) -> Self {
        if delta > epsilon {
            Trend::Up
        } else if delta < -epsilon {
            Trend::Down
        } else {
            Trend::Same
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Same => "",
        }
    }
}

/// One row of a similarity listing
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NeighborRow {
    pub id: ItemId,
    pub text: String,
    /// Cosine similarity to the focal item
    pub score: f64,
    /// Change since this neighbor was last scored, 0 on first sight
    pub delta: f64,
    pub trend: Trend,
    /// Score mapped from [-1, 1] onto [0, 1] for a bar display
    pub fill: f64,
}

/// Cached neighbor order and last-seen scores for one focal item
#[derive(Clone, Debug, Default)]
pub struct NeighborRanking {
    frozen_order: Vec<ItemId>,
    frozen_for: Option<ItemId>,
    last_scores: HashMap<ItemId, f64>,
}

impl NeighborRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// The focal item the current order belongs to
    pub fn frozen_for(&self) -> Option<&ItemId> {
        self.frozen_for.as_ref()
    }

    /// Current frozen order, including ids that may since have been deleted
    pub fn order(&self) -> &[ItemId] {
        &self.frozen_order
    }

    /// Drop the cached order and scores
    pub fn reset(&mut self) {
        self.frozen_order.clear();
        self.frozen_for = None;
        self.last_scores.clear();
    }

    /// Sort every other item by descending similarity to `focal` and freeze it
    ///
    /// Does nothing when an order is already frozen for this focal item.
    pub fn freeze(&mut self, focal: &Item, items: &[Item]) {
        if self.frozen_for.as_ref() == Some(&focal.id) && !self.frozen_order.is_empty() {
            return;
        }

        let mut scored: Vec<(&ItemId, f64)> = items
            .iter()
            .filter(|x| x.id != focal.id)
            .map(|x| (&x.id, cosine(&focal.vector, &x.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        self.frozen_order = scored.into_iter().map(|(id, _)| id.clone()).collect();
        self.frozen_for = Some(focal.id.clone());
        self.last_scores.clear();
        trace!("froze {} neighbors for {}", self.frozen_order.len(), focal.id);
    }

    /// Append a newly created item to the end of the order for `focal_id`
    ///
    /// Only applies while the order is frozen for that focal item.
    pub fn append(&mut self, new_id: &ItemId, focal_id: &ItemId) -> bool {
        if self.frozen_for.as_ref() != Some(focal_id)
            || new_id == focal_id
            || self.frozen_order.contains(new_id)
        {
            return false;
        }
        self.frozen_order.push(new_id.clone());
        true
    }

    /// Re-score the first `limit` neighbors of `focal` in frozen order
    ///
    /// Ids no longer present in `items` are pruned first. Each row's trend
    /// compares against the score recorded on the previous refresh.
    pub fn refresh(
        &mut self,
        focal: &Item,
        items: &[Item],
        limit: usize,
        epsilon: f64,
    ) -> Vec<NeighborRow> {
        let alive: HashSet<&ItemId> = items.iter().map(|x| &x.id).collect();
        let last_scores = &mut self.last_scores;
        self.frozen_order.retain(|id| {
            let keep = alive.contains(id) && *id != focal.id;
            if !keep {
                last_scores.remove(id);
            }
            keep
        });

        let by_id: HashMap<&ItemId, &Item> = items.iter().map(|x| (&x.id, x)).collect();

        let mut rows = Vec::with_capacity(limit.min(self.frozen_order.len()));
        for id in self.frozen_order.iter().take(limit) {
            let Some(other) = by_id.get(id) else {
                continue;
            };

            let score = cosine(&focal.vector, &other.vector);
            let delta = self
                .last_scores
                .insert(id.clone(), score)
                .map(|prev| score - prev)
                .unwrap_or(0.0);

            rows.push(NeighborRow {
                id: id.clone(),
                text: other.text.clone(),
                score,
                delta,
                trend: Trend::of(delta, epsilon),
                fill: ((score + 1.0) / 2.0).clamp(0.0, 1.0),
            });
        }
        rows
    }
}
