//! Session context
//!
//! Owns every piece of mutable state: the items, the PCA basis and its lock,
//! the selection, the neighbor cache and any in-flight drag gesture. Each
//! public method is one discrete command; state mutation completes before the
//! basis or neighbor rows are derived from it.

use crate::config::{clamp_dim, Config};
use crate::embedding::{HashedSource, VectorSource};
use crate::math::{coerce, mean, normalize_if_nonzero, parse_vector};
use crate::model::{Fingerprint, Item, ItemId, ItemKind};
use crate::ops::solve_target_cosine;
use crate::pack::Pack;
use crate::pca::{compute_basis, PcaBasis};
use crate::search::{keyword_filter, NeighborRanking, NeighborRow};
use crate::{Error, Result};
use log::{debug, info, trace, warn};
use std::collections::HashSet;

/// Items created by [`Session::seed_demo`]: (text, type, token)
const DEMO_ITEMS: &[(&str, &str, &str)] = &[
    ("block open", "phrase", "{"),
    ("block close", "phrase", "}"),
    ("repeat", "word", "for"),
    ("times", "word", ""),
    ("print", "word", "console.log"),
    ("set", "word", "="),
    ("to", "word", ""),
    ("counter", "word", "identifier"),
    ("if", "word", "if"),
    ("else", "word", "else"),
    ("(", "token", "("),
    (")", "token", ")"),
];

/// State held for the duration of one drag gesture
#[derive(Clone, Debug)]
struct DragGesture {
    id: ItemId,
    index: usize,
    /// Out-of-plane component captured at gesture start
    residual: Vec<f64>,
    original_vector: Vec<f64>,
    original_point: Option<[f64; 2]>,
    was_locked: bool,
    moved: bool,
}

/// An editing session over a set of items in a shared D-dimensional space
pub struct Session {
    config: Config,
    dim: usize,
    items: Vec<Item>,
    selected: Option<ItemId>,
    basis: Option<PcaBasis>,
    /// Suppresses automatic recomputation while set
    locked: bool,
    neighbors: NeighborRanking,
    drag: Option<DragGesture>,
    source: Box<dyn VectorSource>,
    /// Bumped by every mutating command
    revision: u64,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    /// Create an empty session with the default configuration
    pub fn new() -> Self {
        Session::with_config(Config::default())
    }

    /// Create an empty session using `config`
    pub fn with_config(config: Config) -> Self {
        let config = config.validated();
        Session {
            dim: config.default_dim,
            config,
            items: Vec::new(),
            selected: None,
            basis: None,
            locked: false,
            neighbors: NeighborRanking::new(),
            drag: None,
            source: Box::new(HashedSource::new()),
            revision: 0,
        }
    }

    /// Create an empty session of an exact dimension
    pub fn with_dim(dim: usize) -> Result<Self> {
        if clamp_dim(dim) != dim {
            return Err(Error::DimensionOutOfRange(dim));
        }
        let mut session = Session::new();
        session.dim = dim;
        Ok(session)
    }

    /// Use a different source for fresh vectors
    pub fn with_source(mut self, source: impl VectorSource + 'static) -> Self {
        debug!("using vector source {}", source.name());
        self.source = Box::new(source);
        self
    }

    // === Accessors ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|it| &it.id == id)
    }

    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|it| &it.id == id)
    }

    pub fn selected_id(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Item> {
        self.selected.as_ref().and_then(|id| self.item(id))
    }

    /// The current basis, or `None` for the empty state
    pub fn basis(&self) -> Option<&PcaBasis> {
        self.basis.as_ref()
    }

    /// 2D points aligned with [`items`](Self::items); empty without a basis
    pub fn points(&self) -> &[[f64; 2]] {
        self.basis.as_ref().map(|b| b.points.as_slice()).unwrap_or(&[])
    }

    pub fn point_of(&self, id: &ItemId) -> Option<[f64; 2]> {
        let index = self.index_of(id)?;
        self.points().get(index).copied()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Items whose text or token contains `query`
    pub fn filter(&self, query: &str) -> Vec<&Item> {
        keyword_filter(&self.items, query)
    }

    // === Projection ===

    /// Bring the basis up to date unless it is locked or unchanged
    ///
    /// With fewer than two items the basis is cleared to the empty state.
    pub fn ensure_basis(&mut self) {
        if self.items.len() < 2 {
            self.basis = None;
            return;
        }

        if let Some(basis) = &self.basis {
            // The gesture's residual is only valid against this basis
            if self.drag.is_some() {
                trace!("drag in progress, keeping basis");
                return;
            }
            if self.locked && basis.points.len() == self.items.len() {
                trace!("basis locked, skipping recompute");
                return;
            }
            if basis.revision() == self.revision {
                return;
            }
        }

        let fingerprint = Fingerprint::of_items(self.dim, &self.items);
        if let Some(basis) = self.basis.as_mut() {
            if basis.fingerprint() == fingerprint && basis.points.len() == self.items.len() {
                basis.stamp(fingerprint, self.revision);
                trace!("fingerprint {} unchanged", fingerprint.short());
                return;
            }
        }

        self.rebuild_basis(fingerprint);
    }

    /// Recompute the basis unconditionally and release the lock
    pub fn recompute(&mut self) {
        if self.items.len() < 2 {
            self.basis = None;
        } else {
            let fingerprint = Fingerprint::of_items(self.dim, &self.items);
            self.rebuild_basis(fingerprint);
        }
        self.locked = false;
    }

    fn rebuild_basis(&mut self, fingerprint: Fingerprint) {
        let previous = self.basis.as_ref().map(|b| b.axes.clone());
        let vectors: Vec<&[f64]> = self.items.iter().map(|it| it.vector.as_slice()).collect();
        let revision = self.revision;

        let basis = compute_basis(
            &vectors,
            self.dim,
            previous.as_ref(),
            self.config.power_iterations,
        );
        self.basis = basis.map(|mut b| {
            b.stamp(fingerprint, revision);
            b
        });

        debug!(
            "recomputed basis over {} items (dim {}, fingerprint {})",
            self.items.len(),
            self.dim,
            fingerprint.short()
        );
    }

    /// Out-of-plane component of an item relative to its current 2D point
    ///
    /// All zeros when there is no basis.
    pub fn residual_of(&self, id: &ItemId) -> Option<Vec<f64>> {
        let index = self.index_of(id)?;
        let vector = &self.items[index].vector;
        Some(match &self.basis {
            Some(basis) => {
                let point = basis.points.get(index).copied().unwrap_or([0.0, 0.0]);
                basis.residual(vector, point)
            }
            None => vec![0.0; self.dim],
        })
    }

    /// Project items from `from` onward into the existing basis and lock it,
    /// or recompute when there is no basis yet
    fn place_new_items(&mut self, from: usize) {
        if let Some(basis) = self.basis.as_mut() {
            for item in &self.items[from..] {
                basis.push_point(&item.vector);
            }
            self.locked = true;
            return;
        }
        self.recompute();
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn unique_id(&self) -> ItemId {
        loop {
            let id = ItemId::generate();
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_vector(&self, seed: &str) -> Vec<f64> {
        let mut vector = coerce(self.source.vector(seed, self.dim), self.dim);
        normalize_if_nonzero(&mut vector);
        vector
    }

    // === Selection and neighbors ===

    /// Change the focal item; `None` clears it
    ///
    /// Selecting a different item rebuilds the frozen neighbor order. Unknown
    /// ids leave the selection unchanged and return false.
    pub fn select(&mut self, id: Option<&ItemId>) -> bool {
        let Some(id) = id else {
            self.selected = None;
            self.neighbors.reset();
            return true;
        };
        let Some(item) = self.items.iter().find(|it| &it.id == id) else {
            return false;
        };
        self.neighbors.freeze(item, &self.items);
        self.selected = Some(id.clone());
        true
    }

    /// Similarity rows for the focal item in frozen order
    ///
    /// `limit` defaults to the configured neighbor limit.
    pub fn neighbors(&mut self, limit: Option<usize>) -> Vec<NeighborRow> {
        let limit = limit.unwrap_or(self.config.neighbor_limit);
        let epsilon = self.config.trend_epsilon;

        let focal = self
            .selected
            .as_ref()
            .and_then(|id| self.items.iter().find(|it| &it.id == id));
        let Some(focal) = focal else {
            self.neighbors.reset();
            return Vec::new();
        };

        self.neighbors.freeze(focal, &self.items);
        self.neighbors.refresh(focal, &self.items, limit, epsilon)
    }

    // === Item commands ===

    /// Add an item with a fresh unit vector
    ///
    /// An existing basis is kept and locked, with the new point projected into
    /// it. An existing selection is kept and the new item joins the end of its
    /// neighbor order; otherwise the new item becomes the selection.
    pub fn add_item(
        &mut self,
        text: impl Into<String>,
        kind: impl Into<ItemKind>,
        token: impl Into<String>,
    ) -> ItemId {
        let id = self.unique_id();
        let vector = self.fresh_vector(id.as_str());
        let item = Item::with_id(id.clone(), text, vector)
            .with_kind(kind)
            .with_token(token);
        info!("adding item {} ({:?})", id, item.text);

        self.items.push(item);
        self.touch();

        match self.selected.clone() {
            Some(focal) => {
                self.neighbors.append(&id, &focal);
            }
            None => {
                self.select(Some(&id));
            }
        }

        self.place_new_items(self.items.len() - 1);
        id
    }

    /// Edit an item's text, type and token. Vectors are untouched.
    pub fn update_item(
        &mut self,
        id: &ItemId,
        text: impl Into<String>,
        kind: impl Into<ItemKind>,
        token: impl Into<String>,
    ) -> bool {
        let Some(item) = self.items.iter_mut().find(|it| &it.id == id) else {
            return false;
        };
        item.text = text.into();
        item.kind = kind.into();
        item.token = token.into();
        self.touch();
        true
    }

    /// Remove an item and recompute the basis
    pub fn delete_item(&mut self, id: &ItemId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.items.remove(index);

        if self.selected.as_ref() == Some(id) {
            self.selected = None;
            self.neighbors.reset();
        }
        // Indices and the basis both change, so any gesture ends here
        self.drag = None;

        info!("deleted item {}", id);
        self.touch();
        self.recompute();
        true
    }

    /// Replace an item's vector, normalizing it unless near-zero
    pub fn set_vector(&mut self, id: &ItemId, vector: Vec<f64>) -> bool {
        let dim = self.dim;
        let Some(item) = self.items.iter_mut().find(|it| &it.id == id) else {
            return false;
        };
        item.vector = coerce(vector, dim);
        normalize_if_nonzero(&mut item.vector);
        self.touch();
        self.recompute();
        true
    }

    /// Parse `text` and store it as the item's vector
    ///
    /// Parse failures are reported and leave the session untouched.
    pub fn set_vector_text(&mut self, id: &ItemId, text: &str) -> Result<bool> {
        let vector = parse_vector(text, self.dim)?;
        Ok(self.set_vector(id, vector))
    }

    /// Give an item a new pseudo-random unit vector
    pub fn randomize(&mut self, id: &ItemId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        let vector = self.fresh_vector(&format!("{}#{}", id, self.revision));
        self.set_vector(id, vector)
    }

    /// Rescale an item's vector to unit length
    pub fn normalize_item(&mut self, id: &ItemId) -> bool {
        let Some(item) = self.items.iter_mut().find(|it| &it.id == id) else {
            return false;
        };
        normalize_if_nonzero(&mut item.vector);
        self.touch();
        self.recompute();
        true
    }

    /// Change the session dimension, truncating or zero-padding every vector
    ///
    /// Returns the dimension actually applied after clamping.
    pub fn resize(&mut self, dim: usize) -> usize {
        let dim = clamp_dim(dim);
        self.dim = dim;
        for item in &mut self.items {
            item.vector.resize(dim, 0.0);
            normalize_if_nonzero(&mut item.vector);
        }
        self.drag = None;
        info!("resized session to dimension {}", dim);
        self.touch();
        self.recompute();
        dim
    }

    /// Subtract the mean from every vector, then renormalize
    pub fn center_all(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        let mu = mean(self.items.iter().map(|it| it.vector.as_slice()), self.dim);
        for item in &mut self.items {
            for (x, m) in item.vector.iter_mut().zip(mu.iter()) {
                *x -= m;
            }
            normalize_if_nonzero(&mut item.vector);
        }
        self.touch();
        self.recompute();
        true
    }

    /// Append the demo item set and select the first item
    pub fn seed_demo(&mut self) -> usize {
        for &(text, kind, token) in DEMO_ITEMS {
            let id = self.unique_id();
            let vector = self.fresh_vector(id.as_str());
            let item = Item::with_id(id, text, vector)
                .with_kind(kind)
                .with_token(token);
            self.items.push(item);
        }
        self.touch();

        if let Some(first) = self.items.first().map(|it| it.id.clone()) {
            self.select(Some(&first));
        }
        self.recompute();
        info!("seeded {} demo items", DEMO_ITEMS.len());
        DEMO_ITEMS.len()
    }

    /// Remove every item and reset all derived state
    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
        self.basis = None;
        self.locked = false;
        self.neighbors.reset();
        self.drag = None;
        self.touch();
    }

    // === Direct manipulation ===

    /// Rotate the focal item so its cosine with `other` equals `target`
    ///
    /// The other item is untouched. The basis is locked and only the focal
    /// item's 2D point is re-projected. Returns false (no change) for unknown
    /// or identical ids, or when no rotation plane exists.
    pub fn set_target_cosine_for(&mut self, focal: &ItemId, other: &ItemId, target: f64) -> bool {
        if focal == other {
            return false;
        }
        let (Some(fi), Some(oi)) = (self.index_of(focal), self.index_of(other)) else {
            return false;
        };
        let Some(vector) = solve_target_cosine(&self.items[fi].vector, &self.items[oi].vector, target)
        else {
            return false;
        };

        self.items[fi].vector = vector;
        self.touch();
        self.locked = true;
        if let Some(basis) = self.basis.as_mut() {
            basis.patch_point(fi, &self.items[fi].vector);
        }
        trace!("set cosine({}, {}) to {:.4}", focal, other, target);
        true
    }

    /// [`set_target_cosine_for`](Self::set_target_cosine_for) with the selected item as focal
    pub fn set_target_cosine(&mut self, other: &ItemId, target: f64) -> bool {
        match self.selected.clone() {
            Some(focal) => self.set_target_cosine_for(&focal, other, target),
            None => false,
        }
    }

    /// Begin dragging an item's 2D point
    ///
    /// Brings the basis up to date unless locked, selects the item and
    /// captures its residual. Returns false if the item is unknown or there
    /// is no basis to drag within.
    pub fn drag_start(&mut self, id: &ItemId) -> bool {
        if self.drag.is_some() {
            self.drag_end();
        }
        if !self.locked || self.basis.is_none() {
            self.ensure_basis();
        }
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.select(Some(id));

        let Some(basis) = self.basis.as_ref() else {
            return false;
        };
        let original_point = basis.points.get(index).copied();
        let vector = &self.items[index].vector;
        let residual = basis.residual(vector, original_point.unwrap_or([0.0, 0.0]));

        self.drag = Some(DragGesture {
            id: id.clone(),
            index,
            residual,
            original_vector: vector.clone(),
            original_point,
            was_locked: self.locked,
            moved: false,
        });
        debug!("drag started on {}", id);
        true
    }

    /// Move the dragged point to `(x, y)` and reconstruct its vector
    pub fn drag_step(&mut self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let (Some(gesture), Some(basis)) = (self.drag.as_mut(), self.basis.as_mut()) else {
            return false;
        };
        let Some(item) = self.items.get_mut(gesture.index) else {
            return false;
        };
        if item.id != gesture.id {
            warn!("drag target {} moved, ignoring step", gesture.id);
            return false;
        }

        let mut vector = basis.reconstruct([x, y], &gesture.residual);
        normalize_if_nonzero(&mut vector);
        item.vector = vector;
        if let Some(point) = basis.points.get_mut(gesture.index) {
            *point = [x, y];
        }
        gesture.moved = true;

        self.touch();
        true
    }

    /// Finish the gesture, locking the basis if anything moved
    pub fn drag_end(&mut self) -> bool {
        let Some(gesture) = self.drag.take() else {
            return false;
        };
        if gesture.moved {
            self.locked = true;
        }
        debug!("drag ended on {} (moved: {})", gesture.id, gesture.moved);
        gesture.moved
    }

    /// Abandon the gesture, restoring the vector, point and lock state
    pub fn drag_cancel(&mut self) -> bool {
        let Some(gesture) = self.drag.take() else {
            return false;
        };
        if gesture.moved {
            if let Some(item) = self.items.get_mut(gesture.index) {
                if item.id == gesture.id {
                    item.vector = gesture.original_vector;
                }
            }
            if let (Some(basis), Some(point)) = (self.basis.as_mut(), gesture.original_point) {
                if let Some(slot) = basis.points.get_mut(gesture.index) {
                    *slot = point;
                }
            }
            self.touch();
        }
        self.locked = gesture.was_locked;
        debug!("drag cancelled on {}", gesture.id);
        true
    }

    // === Import / export ===

    /// Merge a pack into the session, returning how many items were added
    ///
    /// An empty session adopts the pack dimension; otherwise incoming vectors
    /// are truncated or zero-padded to the session dimension. Free ids are
    /// kept, taken ones replaced. With an existing basis the new items are
    /// projected into it and the basis locked.
    pub fn import_pack(&mut self, pack: &Pack, source_label: &str) -> usize {
        if self.items.is_empty() {
            self.dim = clamp_dim(pack.metadata.dim);
        }
        let dim = self.dim;
        let start = self.items.len();
        let mut taken: HashSet<ItemId> = self.items.iter().map(|it| it.id.clone()).collect();

        for raw in &pack.items {
            let id = match raw.id.as_deref().filter(|s| !s.is_empty()) {
                Some(s) if !taken.contains(&ItemId::new(s)) => ItemId::new(s),
                _ => loop {
                    let id = ItemId::generate();
                    if !taken.contains(&id) {
                        break id;
                    }
                },
            };
            taken.insert(id.clone());

            let mut vector = match &raw.vector {
                Some(v) => coerce(v.clone(), dim),
                None => {
                    warn!("pack item {} has no vector, using zeros", id);
                    vec![0.0; dim]
                }
            };
            normalize_if_nonzero(&mut vector);

            self.items.push(Item {
                id,
                text: raw.text.clone(),
                kind: ItemKind::from(raw.kind.clone()),
                token: raw.token.clone(),
                vector,
                source: (!source_label.is_empty()).then(|| source_label.to_string()),
            });
        }

        let added = self.items.len() - start;
        if added == 0 {
            return 0;
        }
        self.touch();

        if let Some(focal) = self.selected.clone() {
            for i in start..self.items.len() {
                let new_id = self.items[i].id.clone();
                self.neighbors.append(&new_id, &focal);
            }
        }

        self.place_new_items(start);

        if self.selected.is_none() {
            if let Some(first) = self.items.first().map(|it| it.id.clone()) {
                self.select(Some(&first));
            }
        }

        info!(
            "merged {} items from {}",
            added,
            if source_label.is_empty() { "pack" } else { source_label }
        );
        added
    }

    /// Parse pack JSON and merge it. Invalid packs change nothing.
    pub fn import_json(&mut self, text: &str, source_label: &str) -> Result<usize> {
        let pack = Pack::from_json(text)?;
        Ok(self.import_pack(&pack, source_label))
    }

    /// Snapshot every item as a pack
    pub fn export_pack(&self) -> Pack {
        Pack::from_items(self.dim, &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{cosine, dot, norm};
    use crate::pack::{PackItem, PackMetadata};
    use crate::search::Trend;

    fn pack(dim: usize, items: &[(&str, Vec<f64>)]) -> Pack {
        Pack {
            metadata: PackMetadata {
                version: 1,
                created_at: None,
                dim,
                method: None,
            },
            items: items
                .iter()
                .map(|(id, v)| PackItem {
                    id: Some(id.to_string()),
                    text: id.to_string(),
                    kind: "word".into(),
                    token: String::new(),
                    vector: Some(v.clone()),
                })
                .collect(),
        }
    }

    fn seeded() -> Session {
        let mut s = Session::with_dim(6).unwrap();
        s.seed_demo();
        s
    }

    fn id(s: &str) -> ItemId {
        ItemId::new(s)
    }

    #[test]
    fn test_empty_and_single_have_no_basis() {
        let mut s = Session::new();
        s.ensure_basis();
        assert!(s.basis().is_none());
        assert!(s.points().is_empty());

        s.add_item("solo", "word", "");
        assert!(s.basis().is_none());
        assert!(s.points().is_empty());
    }

    #[test]
    fn test_two_item_example() {
        let mut s = Session::new();
        s.import_pack(&pack(2, &[("A", vec![1.0, 0.0]), ("B", vec![0.0, 1.0])]), "");

        assert_eq!(s.dim(), 2);
        let basis = s.basis().unwrap();
        assert_eq!(basis.mean, vec![0.5, 0.5]);
        let p = s.points();
        assert_eq!(p.len(), 2);
        assert!((p[0][0] + p[1][0]).abs() < 1e-9);
        assert!(dot(&basis.axes[0], &basis.axes[1]).abs() < 1e-9);
    }

    #[test]
    fn test_ensure_basis_uses_cache() {
        let mut s = seeded();
        let before = s.basis().unwrap().clone();

        s.ensure_basis();
        assert_eq!(s.basis().unwrap(), &before);

        // Metadata edits bump the revision but not the fingerprint
        let first = s.items()[0].id.clone();
        s.update_item(&first, "renamed", "phrase", "{");
        s.ensure_basis();
        assert_eq!(s.basis().unwrap().axes, before.axes);
        assert_eq!(s.basis().unwrap().revision(), s.revision());
    }

    #[test]
    fn test_lock_suppresses_recompute_until_explicit() {
        let mut s = seeded();
        let ids: Vec<ItemId> = s.items().iter().map(|it| it.id.clone()).collect();
        assert!(!s.is_locked());

        assert!(s.set_target_cosine_for(&ids[0], &ids[1], 0.9));
        assert!(s.is_locked());

        let locked_axes = s.basis().unwrap().axes.clone();
        s.ensure_basis();
        assert_eq!(s.basis().unwrap().axes, locked_axes);

        s.recompute();
        assert!(!s.is_locked());
        assert_ne!(s.basis().unwrap().fingerprint(), Fingerprint::EMPTY);
    }

    #[test]
    fn test_target_cosine_patches_only_focal_point() {
        let mut s = seeded();
        let ids: Vec<ItemId> = s.items().iter().map(|it| it.id.clone()).collect();
        let before_points = s.points().to_vec();
        let other_before = s.items()[3].vector.clone();

        assert!(s.set_target_cosine_for(&ids[0], &ids[3], -0.25));

        let focal = &s.items()[0].vector;
        assert!((cosine(focal, &other_before) + 0.25).abs() < 1e-6);
        assert!((norm(focal) - 1.0).abs() < 1e-6);
        assert_eq!(s.items()[3].vector, other_before);

        let basis = s.basis().unwrap();
        assert_eq!(s.points()[0], basis.project(focal));
        assert_eq!(&s.points()[1..], &before_points[1..]);

        // Same target again leaves the vector in place
        let once = s.items()[0].vector.clone();
        assert!(s.set_target_cosine_for(&ids[0], &ids[3], -0.25));
        for (a, b) in once.iter().zip(s.items()[0].vector.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_target_cosine_referential_noops() {
        let mut s = seeded();
        let first = s.items()[0].id.clone();
        let rev = s.revision();

        assert!(!s.set_target_cosine_for(&first, &first, 0.5));
        assert!(!s.set_target_cosine_for(&first, &id("nope"), 0.5));
        assert!(!s.set_target_cosine_for(&id("nope"), &first, 0.5));
        assert_eq!(s.revision(), rev);
        assert!(!s.is_locked());

        s.select(None);
        assert!(!s.set_target_cosine(&first, 0.5));
    }

    #[test]
    fn test_add_item_projects_into_existing_basis() {
        let mut s = seeded();
        let before = s.points().to_vec();
        let axes = s.basis().unwrap().axes.clone();

        let new_id = s.add_item("while", "word", "while");

        assert!(s.is_locked());
        assert_eq!(s.points().len(), s.len());
        assert_eq!(&s.points()[..before.len()], &before[..]);
        assert_eq!(s.basis().unwrap().axes, axes);

        let v = &s.item(&new_id).unwrap().vector;
        assert_eq!(v.len(), 6);
        assert!((norm(v) - 1.0).abs() < 1e-9);
        assert_eq!(s.point_of(&new_id), Some(s.basis().unwrap().project(v)));
    }

    #[test]
    fn test_add_item_keeps_frozen_neighbor_order() {
        let mut s = seeded();
        let focal = s.selected_id().cloned().unwrap();
        let before: Vec<ItemId> = s.neighbors(Some(100)).into_iter().map(|r| r.id).collect();

        let new_id = s.add_item("while", "word", "while");
        assert_eq!(s.selected_id(), Some(&focal));

        let after: Vec<ItemId> = s.neighbors(Some(100)).into_iter().map(|r| r.id).collect();
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.last(), Some(&new_id));
    }

    #[test]
    fn test_add_without_selection_selects_new_item() {
        let mut s = Session::new();
        let a = s.add_item("a", "word", "");
        assert_eq!(s.selected_id(), Some(&a));
        let b = s.add_item("b", "token", "+");
        assert_eq!(s.selected_id(), Some(&a));
        assert_eq!(s.item(&b).unwrap().kind, ItemKind::Token);
        // Second item triggers the first real basis
        assert_eq!(s.points().len(), 2);
        assert!(!s.is_locked());
    }

    #[test]
    fn test_neighbors_track_trend_without_reordering() {
        let mut s = seeded();
        let rows = s.neighbors(None);
        assert_eq!(rows.len(), 11);
        let order: Vec<ItemId> = rows.iter().map(|r| r.id.clone()).collect();

        let last = order.last().cloned().unwrap();
        assert!(s.set_target_cosine(&last, 0.99));

        let rows = s.neighbors(None);
        let reordered: Vec<ItemId> = rows.iter().map(|r| r.id.clone()).collect();
        assert_eq!(reordered, order);
        let moved = rows.iter().find(|r| r.id == last).unwrap();
        assert_eq!(moved.trend, Trend::Up);
        assert!((moved.score - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_neighbors_limit_and_no_selection() {
        let mut s = seeded();
        assert_eq!(s.neighbors(Some(3)).len(), 3);
        s.select(None);
        assert!(s.neighbors(None).is_empty());
        assert!(!s.select(Some(&id("missing"))));
        assert!(s.selected_id().is_none());
    }

    #[test]
    fn test_drag_moves_within_plane() {
        let mut s = seeded();
        let target = s.items()[4].id.clone();
        let residual = s.residual_of(&target).unwrap();
        let others_before = s.points().to_vec();

        assert!(s.drag_start(&target));
        assert_eq!(s.selected_id(), Some(&target));
        assert!(s.drag_step(0.25, -0.4));
        assert!(s.drag_step(0.3, -0.35));
        assert!(!s.is_locked());
        assert!(s.drag_end());
        assert!(s.is_locked());

        assert_eq!(s.point_of(&target), Some([0.3, -0.35]));
        let v = &s.item(&target).unwrap().vector;
        assert!((norm(v) - 1.0).abs() < 1e-9);

        // Before normalization the vector was mean + x W1 + y W2 + residual
        let basis = s.basis().unwrap();
        let raw = basis.reconstruct([0.3, -0.35], &residual);
        let scale = norm(&raw);
        for (a, b) in v.iter().zip(raw.iter()) {
            assert!((a - b / scale).abs() < 1e-9);
        }

        for (i, (now, was)) in s.points().iter().zip(others_before.iter()).enumerate() {
            if i != 4 {
                assert_eq!(now, was);
            }
        }
    }

    #[test]
    fn test_basis_held_during_drag() {
        let mut s = seeded();
        let target = s.items()[4].id.clone();
        let axes = s.basis().unwrap().axes.clone();
        let before = s.points().to_vec();

        assert!(s.drag_start(&target));
        assert!(s.drag_step(0.9, -0.8));
        s.ensure_basis();
        assert_eq!(s.basis().unwrap().axes, axes);
        assert_eq!(s.point_of(&target), Some([0.9, -0.8]));

        assert!(s.drag_step(0.5, 0.1));
        s.ensure_basis();
        for (i, (now, was)) in s.points().iter().zip(before.iter()).enumerate() {
            if i != 4 {
                assert_eq!(now, was);
            }
        }

        assert_eq!(s.point_of(&target), Some([0.5, 0.1]));

        assert!(s.drag_end());
        s.ensure_basis();
        assert_eq!(s.basis().unwrap().axes, axes);
    }

    #[test]
    fn test_delete_ends_drag() {
        let mut s = seeded();
        let target = s.items()[4].id.clone();
        let other = s.items()[7].id.clone();
        assert!(s.drag_start(&target));
        assert!(s.delete_item(&other));
        assert!(!s.is_dragging());
        assert!(!s.drag_step(0.1, 0.1));
    }

    #[test]
    fn test_drag_cancel_restores_state() {
        let mut s = seeded();
        let target = s.items()[2].id.clone();
        let vector_before = s.item(&target).unwrap().vector.clone();
        let point_before = s.point_of(&target);

        assert!(s.drag_start(&target));
        assert!(s.drag_step(1.0, 1.0));
        assert!(s.drag_cancel());

        assert_eq!(s.item(&target).unwrap().vector, vector_before);
        assert_eq!(s.point_of(&target), point_before);
        assert!(!s.is_locked());
        assert!(!s.is_dragging());
    }

    #[test]
    fn test_drag_without_movement_keeps_lock_state() {
        let mut s = seeded();
        let target = s.items()[1].id.clone();
        assert!(s.drag_start(&target));
        assert!(!s.drag_end());
        assert!(!s.is_locked());

        assert!(!s.drag_start(&id("ghost")));
        assert!(!s.drag_step(0.0, 0.0));
    }

    #[test]
    fn test_import_adopts_dim_then_coerces() {
        let p4 = pack(4, &[("a", vec![1.0, 2.0, 0.0, 0.0]), ("b", vec![0.0, 0.0, 3.0, 0.0])]);

        let mut empty = Session::new();
        assert_eq!(empty.import_pack(&p4, "p4.json"), 2);
        assert_eq!(empty.dim(), 4);
        assert_eq!(empty.item(&id("a")).unwrap().source.as_deref(), Some("p4.json"));

        let mut eight = Session::new();
        eight.import_pack(&pack(8, &[("x", vec![1.0; 8])]), "");
        assert_eq!(eight.import_pack(&p4, ""), 2);
        assert_eq!(eight.dim(), 8);
        assert!(eight.items().iter().all(|it| it.vector.len() == 8));
        let a = &eight.item(&id("a")).unwrap().vector;
        assert!((norm(a) - 1.0).abs() < 1e-9);
        assert_eq!(&a[4..], &[0.0; 4]);
    }

    #[test]
    fn test_import_reassigns_taken_ids() {
        let p = pack(3, &[("a", vec![1.0, 0.0, 0.0]), ("b", vec![0.0, 1.0, 0.0])]);
        let mut s = Session::new();
        s.import_pack(&p, "");
        s.import_pack(&p, "");

        assert_eq!(s.len(), 4);
        let unique: HashSet<&ItemId> = s.items().iter().map(|it| &it.id).collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(s.selected_id(), Some(&id("a")));
    }

    #[test]
    fn test_import_into_existing_basis_locks_layout() {
        let mut s = seeded();
        let before = s.points().to_vec();
        let axes = s.basis().unwrap().axes.clone();

        let added = s.import_pack(&pack(6, &[("n1", vec![1.0; 6]), ("n2", vec![-1.0; 6])]), "");
        assert_eq!(added, 2);
        assert!(s.is_locked());
        assert_eq!(s.basis().unwrap().axes, axes);
        assert_eq!(&s.points()[..before.len()], &before[..]);
        assert_eq!(s.points().len(), s.len());
    }

    #[test]
    fn test_import_missing_vector_is_zero() {
        let mut s = Session::new();
        s.import_json(
            r#"{ "metadata": { "dim": 3 }, "items": [ { "text": "blank" }, { "id": "", "text": "x", "vector": [0, 0, 2] } ] }"#,
            "",
        )
        .unwrap();

        assert_eq!(s.items()[0].vector, vec![0.0; 3]);
        assert_eq!(s.items()[1].vector, vec![0.0, 0.0, 1.0]);
        assert!(!s.items()[1].id.as_str().is_empty());
    }

    #[test]
    fn test_invalid_import_changes_nothing() {
        let mut s = seeded();
        let rev = s.revision();
        assert!(s.import_json(r#"{ "items": [] }"#, "").is_err());
        assert!(s.import_json("{", "").is_err());
        assert_eq!(s.revision(), rev);
        assert_eq!(s.len(), 12);
    }

    #[test]
    fn test_export_roundtrip() {
        let s = seeded();
        let json = s.export_pack().to_json_pretty().unwrap();

        let mut restored = Session::new();
        restored.import_json(&json, "").unwrap();
        assert_eq!(restored.dim(), 6);
        assert_eq!(restored.len(), s.len());
        for (a, b) in restored.items().iter().zip(s.items()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.token, b.token);
            for (x, y) in a.vector.iter().zip(b.vector.iter()) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_set_vector_text() {
        let mut s = seeded();
        let target = s.items()[0].id.clone();
        let before = s.item(&target).unwrap().vector.clone();
        let rev = s.revision();

        assert!(s.set_vector_text(&target, "1, x, 3").is_err());
        assert_eq!(s.item(&target).unwrap().vector, before);
        assert_eq!(s.revision(), rev);

        assert!(s.set_vector_text(&target, "3 4").unwrap());
        assert_eq!(s.item(&target).unwrap().vector, vec![0.6, 0.8, 0.0, 0.0, 0.0, 0.0]);

        assert!(s.set_vector_text(&target, "0 0 0").unwrap());
        assert_eq!(s.item(&target).unwrap().vector, vec![0.0; 6]);

        assert!(!s.set_vector_text(&id("nope"), "1").unwrap());
    }

    #[test]
    fn test_mutations_recompute_and_unlock() {
        let mut s = seeded();
        let first = s.items()[0].id.clone();
        let second = s.items()[1].id.clone();
        s.set_target_cosine_for(&first, &second, 0.1);
        assert!(s.is_locked());

        let before = s.item(&first).unwrap().vector.clone();
        assert!(s.randomize(&first));
        assert_ne!(s.item(&first).unwrap().vector, before);
        assert!(!s.is_locked());

        assert!(s.normalize_item(&first));
        assert!(!s.randomize(&id("nope")));
        assert!(!s.normalize_item(&id("nope")));
    }

    #[test]
    fn test_delete_clears_selection_and_recomputes() {
        let mut s = seeded();
        let focal = s.selected_id().cloned().unwrap();
        assert!(s.delete_item(&focal));
        assert!(s.selected_id().is_none());
        assert_eq!(s.len(), 11);
        assert_eq!(s.points().len(), 11);
        assert!(!s.delete_item(&focal));
    }

    #[test]
    fn test_delete_down_to_one_clears_basis() {
        let mut s = Session::new();
        s.import_pack(&pack(2, &[("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])]), "");
        assert!(s.basis().is_some());
        s.delete_item(&id("b"));
        assert!(s.basis().is_none());
        assert!(s.points().is_empty());
    }

    #[test]
    fn test_resize_and_center() {
        let mut s = seeded();
        assert_eq!(s.resize(3), 3);
        assert!(s.items().iter().all(|it| it.vector.len() == 3));
        assert_eq!(s.resize(1000), 256);
        assert!(s.items().iter().all(|it| it.vector.len() == 256));
        assert_eq!(s.basis().unwrap().dim(), 256);

        assert!(s.center_all());
        for it in s.items() {
            assert!((norm(&it.vector) - 1.0).abs() < 1e-9 || crate::math::is_near_zero(&it.vector));
        }
        assert!(!Session::new().center_all());
    }

    #[test]
    fn test_seed_and_clear() {
        let mut s = Session::new();
        assert_eq!(s.seed_demo(), 12);
        assert_eq!(s.selected().map(|it| it.text.as_str()), Some("block open"));
        assert_eq!(s.points().len(), 12);
        assert_eq!(s.filter("block").len(), 2);

        s.clear();
        assert!(s.is_empty());
        assert!(s.basis().is_none());
        assert!(s.selected_id().is_none());
        assert!(!s.is_locked());
    }

    #[test]
    fn test_with_dim_validates() {
        assert!(matches!(Session::with_dim(1), Err(Error::DimensionOutOfRange(1))));
        assert!(Session::with_dim(300).is_err());
        assert_eq!(Session::with_dim(2).unwrap().dim(), 2);
    }
}
