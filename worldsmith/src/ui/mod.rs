//! UI module for the world-model editor TUI

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;
