//! Editor session: document, selection and history.

use std::collections::VecDeque;
use std::fmt;

use super::{resize_rect, Command, Handle, ResizeGesture};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::model::{Document, Region, RegionId, RegionKind, TextStyle};

/// Region states captured before an edit.
#[derive(Debug, Clone)]
struct Snapshot(Vec<(RegionId, Region)>);

/// Number of undo steps kept unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Owns a document while it is being edited.
///
/// Selection is a single region, global across pages. Commands run
/// synchronously; a failing command leaves the document unchanged.
/// History keeps at most `history_limit` undo steps; the oldest step is
/// dropped first.
pub struct EditorSession {
    document: Document,
    selection: Option<RegionId>,
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    history_limit: usize,
}

impl EditorSession {
    /// Start editing `document`.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: None,
            undo: VecDeque::new(),
            redo: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Keep at most `limit` undo steps (0 disables history).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// Maximum number of undo steps kept.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Number of undo steps currently available.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// The document being edited.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Finish editing and take the document back.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Currently selected region.
    pub fn selection(&self) -> Option<RegionId> {
        self.selection
    }

    /// Apply one command.
    pub fn apply(&mut self, command: Command) -> Result<()> {
        log::debug!("Editor command: {:?}", command);
        match command {
            Command::Select { id } => self.select(id),
            Command::ClearSelection => {
                self.clear_selection();
                Ok(())
            }
            Command::ToggleActive { id } => self.toggle_active(id),
            Command::Reclassify { id } => self.reclassify(id),
            Command::Resize { id, handle, dx, dy } => self.resize(id, handle, dx, dy).map(|_| ()),
            Command::SetStyle { style } => self.set_style(style),
            Command::ApplyStyleGlobally { style } => {
                self.apply_style_globally(style);
                Ok(())
            }
            Command::BroadcastSelectedStyle => self.broadcast_selected_style(),
        }
    }

    /// Apply commands in order, stopping at the first failure.
    pub fn apply_all(&mut self, commands: impl IntoIterator<Item = Command>) -> Result<()> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    /// Select a region.
    pub fn select(&mut self, id: RegionId) -> Result<()> {
        self.document.region(id)?;
        self.selection = Some(id);
        Ok(())
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Flip a region between active and inactive.
    pub fn toggle_active(&mut self, id: RegionId) -> Result<()> {
        self.edit(id, |region| region.active = !region.active)
    }

    /// Flip a region between text and image. A region becoming text with no
    /// style gets the default style; an existing style is kept.
    pub fn reclassify(&mut self, id: RegionId) -> Result<()> {
        self.edit(id, |region| {
            region.kind = region.kind.flipped();
            if region.kind == RegionKind::Text && region.style.is_none() {
                region.style = Some(TextStyle::default());
            }
        })
    }

    /// Drag a corner handle by `(dx, dy)` in one step. Returns the new rect.
    pub fn resize(&mut self, id: RegionId, handle: Handle, dx: f32, dy: f32) -> Result<Rect> {
        let start = self.document.region(id)?.rect;
        let rect = resize_rect(start, handle, dx, dy);
        self.edit(id, |region| region.rect = rect)?;
        Ok(rect)
    }

    /// Begin an interactive drag on a corner handle.
    pub fn begin_resize(&mut self, id: RegionId, handle: Handle) -> Result<ResizeGesture<'_>> {
        let before = self.document.region(id)?.clone();
        Ok(ResizeGesture::new(self, id, handle, before))
    }

    /// Replace the style of the selected text region.
    pub fn set_style(&mut self, style: TextStyle) -> Result<()> {
        let id = self.selected_text()?;
        let style = normalized(style);
        self.edit(id, |region| region.style = Some(style))
    }

    /// Overwrite the style of every text region on every page, including
    /// inactive ones.
    pub fn apply_style_globally(&mut self, style: TextStyle) {
        let style = normalized(style);
        let before: Vec<(RegionId, Region)> = self
            .document
            .regions()
            .filter(|(_, r)| r.is_text())
            .map(|(id, r)| (id, r.clone()))
            .collect();
        if before.is_empty() {
            return;
        }

        for region in self.document.regions_mut().filter(|r| r.is_text()) {
            region.style = Some(style);
        }
        log::debug!("Applied style to {} text regions", before.len());
        self.record(Snapshot(before));
    }

    /// Broadcast the selected text region's style to every text region.
    pub fn broadcast_selected_style(&mut self) -> Result<()> {
        let id = self.selected_text()?;
        let style = self.document.region(id)?.effective_style();
        self.apply_style_globally(style);
        Ok(())
    }

    /// Whether there is an edit to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether there is an undone edit to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Revert the most recent edit. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop_back() {
            Some(snapshot) => {
                let inverse = self.restore(snapshot);
                self.redo.push(inverse);
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone edit. Returns `false` when there is none.
    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(snapshot) => {
                let inverse = self.restore(snapshot);
                self.push_undo(inverse);
                true
            }
            None => false,
        }
    }

    fn selected_text(&self) -> Result<RegionId> {
        let id = self.selection.ok_or(Error::NoSelection)?;
        if self.document.region(id)?.is_text() {
            Ok(id)
        } else {
            Err(Error::NotText(id))
        }
    }

    fn edit(&mut self, id: RegionId, f: impl FnOnce(&mut Region)) -> Result<()> {
        let region = self.document.region_mut(id)?;
        let before = region.clone();
        f(region);
        self.record(Snapshot(vec![(id, before)]));
        Ok(())
    }

    fn record(&mut self, snapshot: Snapshot) {
        self.push_undo(snapshot);
        self.redo.clear();
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo.push_back(snapshot);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.undo.len() > self.history_limit {
            self.undo.pop_front();
        }
    }

    /// Put the snapshot's regions back and return what they replaced.
    fn restore(&mut self, snapshot: Snapshot) -> Snapshot {
        let mut replaced = Vec::with_capacity(snapshot.0.len());
        for (id, region) in snapshot.0 {
            match self.document.region_mut(id) {
                Ok(slot) => replaced.push((id, std::mem::replace(slot, region))),
                Err(e) => log::warn!("Skipping history entry: {}", e),
            }
        }
        Snapshot(replaced)
    }

    pub(super) fn set_rect_untracked(&mut self, id: RegionId, rect: Rect) {
        if let Ok(region) = self.document.region_mut(id) {
            region.rect = rect;
        }
    }

    pub(super) fn finish_gesture(&mut self, id: RegionId, before: &Region) {
        let changed = self
            .document
            .region(id)
            .map(|r| r.rect != before.rect)
            .unwrap_or(false);
        if changed {
            self.record(Snapshot(vec![(id, before.clone())]));
        }
    }
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("undo", &self.undo.len())
            .field("redo", &self.redo.len())
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

fn normalized(style: TextStyle) -> TextStyle {
    TextStyle::new(style.font_family, style.font_size, style.text_align)
}
