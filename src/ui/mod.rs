//! Widgets for the catalog window
//!
//! - `grid`: the card grid and its empty state
//! - `detail`: the detail modal body and the preview mount point
//! - `form`: the add-coin form
//! - `modal`: overlay helper and the delete confirmation
//! - `viewer`: canvas that paints an active 3D scene

pub mod detail;
pub mod form;
pub mod grid;
pub mod modal;
pub mod viewer;
