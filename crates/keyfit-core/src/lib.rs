// Re-export wire types so they are reachable as keyfit_core::protocol
pub use keyfit_protocol::protocol;

// Internal Modules
pub mod config;
pub mod consts;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod geometry;
pub mod heatmap;
pub mod keycodes;
pub mod layouts;
pub mod prefs;
pub mod query;
pub mod ranking;
pub mod render;
pub mod util;
