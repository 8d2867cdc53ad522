//! Terminal browser for the popular-movies catalog with persistent favorites.

pub mod app;
pub mod catalog;
pub mod config;
pub mod favorites;
pub mod feed;
pub mod keybindings;
pub mod storage;
pub mod ui;
pub mod util;
