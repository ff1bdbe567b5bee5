//! Widgets for the editor TUI

pub mod map_view;
pub mod status_bar;
pub mod tile_panel;

pub use map_view::MapViewWidget;
pub use status_bar::StatusBarWidget;
pub use tile_panel::TilePanelWidget;
