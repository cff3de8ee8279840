//! Linear undo/redo history of committed path groups.

use crate::geometry::Shape;
use crate::path::{GroupId, PathGroup};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Sizes of the two stacks, used to enable or disable undo/redo controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryCounts {
    pub undo_count: usize,
    pub redo_count: usize,
}

/// Committed and undone path groups.
///
/// `committed` followed by `undone` in reverse is the full edit timeline.
/// Any new insert discards the undone entries, so history never branches.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    committed: Vec<PathGroup>,
    undone: Vec<PathGroup>,
    /// Union of every point in `committed`.
    extents: Option<Rect>,
}

impl EditHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a new group. Pending redos are dropped.
    pub fn insert(&mut self, group: PathGroup) {
        if let Some(bounds) = group.bounds() {
            let bounds = Rect::from(bounds);
            self.extents = Some(match self.extents {
                Some(extents) => extents.union(bounds),
                None => bounds,
            });
        }
        if !self.undone.is_empty() {
            log::debug!("Dropping {} redo entries", self.undone.len());
            self.undone.clear();
        }
        self.committed.push(group);
    }

    /// Undo the last commit.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(group) = self.committed.pop() else {
            return false;
        };
        self.undone.push(group);
        self.recompute_extents();
        true
    }

    /// Redo the last undone commit.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(group) = self.undone.pop() else {
            return false;
        };
        self.committed.push(group);
        self.recompute_extents();
        true
    }

    /// Delete a committed group, e.g. when persisting it failed.
    pub fn remove(&mut self, id: GroupId) -> Option<PathGroup> {
        let index = self.committed.iter().position(|g| g.id() == id)?;
        let group = self.committed.remove(index);
        self.recompute_extents();
        Some(group)
    }

    /// Release every retained group.
    pub fn destroy(&mut self) {
        self.committed.clear();
        self.undone.clear();
        self.extents = None;
    }

    /// Bounding box of every committed point, or `None` when nothing is
    /// committed.
    pub fn bounding_box(&self) -> Option<Shape> {
        self.extents.map(Shape::from)
    }

    /// Bounding box of the committed points on `page`.
    pub fn page_bounding_box(&self, page: u32) -> Option<Shape> {
        self.committed
            .iter()
            .filter(|g| g.page() == page)
            .filter_map(|g| g.bounds().map(Rect::from))
            .reduce(|a, b| a.union(b))
            .map(Shape::from)
    }

    /// Get the undo and redo stack sizes.
    pub fn counts(&self) -> HistoryCounts {
        HistoryCounts {
            undo_count: self.committed.len(),
            redo_count: self.undone.len(),
        }
    }

    /// Check if there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.committed.is_empty()
    }

    /// Check if there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Committed groups, oldest first.
    pub fn committed(&self) -> &[PathGroup] {
        &self.committed
    }

    /// Undone groups, most recently undone last.
    pub fn undone(&self) -> &[PathGroup] {
        &self.undone
    }

    /// Get a committed group by id.
    pub fn get(&self, id: GroupId) -> Option<&PathGroup> {
        self.committed.iter().find(|g| g.id() == id)
    }

    /// Topmost committed group on `page` passing within `tolerance` of
    /// `point`.
    pub fn group_at(&self, page: u32, point: Point, tolerance: f64) -> Option<&PathGroup> {
        self.committed
            .iter()
            .rev()
            .filter(|g| g.page() == page)
            .find(|g| g.hit_test(point, tolerance))
    }

    fn recompute_extents(&mut self) {
        self.extents = self
            .committed
            .iter()
            .filter_map(|g| g.bounds().map(Rect::from))
            .reduce(|a, b| a.union(b));
    }
}
