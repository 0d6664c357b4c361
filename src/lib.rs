//! A kanban board with snapshot undo/redo and pointer drag reordering.

pub mod app;
pub mod board;
pub mod config;
pub mod drag;
pub mod input;
pub mod ui;
