//! Terminal user interface.
//!
//! - `loop_runner` - main event loop and terminal management
//! - `input` - keyboard input handling
//! - `events` - background task results
//! - `render` - view dispatch
//! - `movies` - popular feed list with the loading sentinel
//! - `favorites_list` - favorites view
//! - `status` - status bar
//! - `help` - keybinding overlay
//! - `helpers` - task spawning and list scrolling

mod events;
mod favorites_list;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod movies;
mod render;
mod status;

pub use helpers::spawn_favorites_load;
pub use loop_runner::{run, Action};
