//! agora-editor-core: editor logic for the forum's rich-text fields.
//!
//! This crate provides:
//! - `HostSurface` trait for the live editing surface
//! - `HeadlessSurface` - in-memory implementation
//! - `EditorController` - toolbar commands, load/save and mention deletion
//! - a shared render surface for delta-to-HTML rendering

pub mod actions;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod headless;
pub mod mention;
pub mod render_surface;
pub mod surface;

pub use actions::{Key, KeydownResult};
pub use commands::FormatCommand;
pub use config::EditorConfig;
pub use controller::{EditorController, FontStep};
pub use error::EditorError;
pub use headless::HeadlessSurface;
pub use mention::{MentionDeleteState, MentionEffect, MentionEvent, Transition, transition};
pub use render_surface::{RenderSurface, render_delta_to_html, with_render_surface};
pub use surface::{CursorRect, Format, HostSurface, Selection, SurfaceError};
