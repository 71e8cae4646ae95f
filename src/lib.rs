//! Extended window status library.
//!
//! Derives a tri-state Open / Closed / Tilted status for a window from a
//! primary contact sensor plus either a rotation value or a second contact
//! sensor, and exposes it as a derived entity of an automation host.

pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod integration;
pub mod status;
pub mod window;

pub use error::{Result, WindowError};
pub use status::{Mode, WindowStatus, resolve};
