//! `scriptbook` — a standalone list-and-form editor over a JSON script file.
//!
//! Entirely independent of the taskmill scheduler: a flat collection of
//! named shell commands is persisted to one JSON file, rewritten wholesale
//! on every mutation. The [`editor::Editor`] is an explicit two-state
//! machine (viewing the list / editing the add form) with a thin
//! line-oriented front end in the binary.

pub mod book;
pub mod editor;
pub mod error;

pub use book::{ScriptBook, ScriptEntry};
pub use editor::{Draft, Editor, EditorState};
pub use error::{BookError, Result};
