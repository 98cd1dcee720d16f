//! Car market dashboard: cleaning and aggregation of marketplace listings,
//! plus the egui front end that charts them.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod pages;
pub mod state;
pub mod ui;
