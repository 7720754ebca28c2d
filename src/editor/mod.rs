//! Region editor.
//!
//! User gestures are expressed as [`Command`]s applied to an
//! [`EditorSession`], which owns the document and the single global
//! selection. Every mutating command is one undo step.

mod command;
mod resize;
mod session;

pub use command::Command;
pub use resize::{resize_rect, Handle, ResizeGesture, MIN_REGION_SIZE};
pub use session::{EditorSession, DEFAULT_HISTORY_LIMIT};
