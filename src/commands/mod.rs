// src/commands/mod.rs
//! Command handlers for the cooker CLI

mod cook;
mod status;

pub use cook::cmd_cook;
pub use status::cmd_status;
