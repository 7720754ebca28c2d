//! Corner-handle resizing.

use serde::{Deserialize, Serialize};

use super::EditorSession;
use crate::geometry::Rect;
use crate::model::{Region, RegionId};

/// Smallest width and height a resize can produce, in pixels.
pub const MIN_REGION_SIZE: f32 = 10.0;

/// Corner handle being dragged. The opposite corner stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handle {
    /// Top-left
    #[serde(rename = "nw")]
    NorthWest,
    /// Top-right
    #[serde(rename = "ne")]
    NorthEast,
    /// Bottom-left
    #[serde(rename = "sw")]
    SouthWest,
    /// Bottom-right
    #[serde(rename = "se")]
    SouthEast,
}

impl Handle {
    fn moves_left_edge(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::SouthWest)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Handle::NorthWest | Handle::NorthEast)
    }
}

/// Resize `start` by dragging `handle` by `(dx, dy)`.
///
/// Width and height never drop below [`MIN_REGION_SIZE`], including when
/// the handle is dragged past the opposite edge.
pub fn resize_rect(start: Rect, handle: Handle, dx: f32, dy: f32) -> Rect {
    let (x, width) = if handle.moves_left_edge() {
        let width = (start.width - dx).max(MIN_REGION_SIZE);
        (start.right() - width, width)
    } else {
        (start.x, (start.width + dx).max(MIN_REGION_SIZE))
    };
    let (y, height) = if handle.moves_top_edge() {
        let height = (start.height - dy).max(MIN_REGION_SIZE);
        (start.bottom() - height, height)
    } else {
        (start.y, (start.height + dy).max(MIN_REGION_SIZE))
    };
    Rect::new(x, y, width, height)
}

/// An in-progress drag on one region's corner handle.
///
/// Holds the session mutably for its whole lifetime. Each
/// [`drag_to`](Self::drag_to) recomputes from the rectangle captured when the
/// gesture began. Dropping the guard ends the gesture and records one undo
/// step if the rectangle changed.
pub struct ResizeGesture<'a> {
    session: &'a mut EditorSession,
    id: RegionId,
    handle: Handle,
    before: Region,
}

impl<'a> ResizeGesture<'a> {
    pub(super) fn new(
        session: &'a mut EditorSession,
        id: RegionId,
        handle: Handle,
        before: Region,
    ) -> Self {
        Self {
            session,
            id,
            handle,
            before,
        }
    }

    /// Region being resized.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Move the handle to `(dx, dy)` from where the drag started.
    pub fn drag_to(&mut self, dx: f32, dy: f32) -> Rect {
        let rect = resize_rect(self.before.rect, self.handle, dx, dy);
        self.session.set_rect_untracked(self.id, rect);
        rect
    }

    /// Abandon the gesture, restoring the starting rectangle.
    pub fn cancel(self) {
        let start = self.before.rect;
        self.session.set_rect_untracked(self.id, start);
    }
}

impl Drop for ResizeGesture<'_> {
    fn drop(&mut self) {
        self.session.finish_gesture(self.id, &self.before);
    }
}
