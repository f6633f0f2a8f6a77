#![forbid(unsafe_code)]

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod engine;
pub mod events;
pub mod hyprctl;
pub mod types;
