// src/cook/priority.rs

//! Stage ordering of the built-in tasks
//!
//! Lower values cook first. UI movies generate images consumed by the
//! texture stage, so they must run before it.

pub const UI_MOVIE: i32 = 10;
pub const TEXTURE: i32 = 20;
pub const FONT: i32 = 30;
pub const SCENE_ASSET: i32 = 40;
pub const SCRIPT: i32 = 50;
