//! photo-tui - Terminal viewer
//!
//! Steps through the catalogue one photo at a time and lets the user attach
//! tags by typing their names, with completion against existing concepts.
//! [`ViewerState`] holds all the behavior; [`run`] only maps keys to
//! [`Action`]s and draws the state.

mod app;
mod state;

pub use app::{draw, map_key, run};
pub use state::{Action, ViewerState};
