// src/content/platform.rs

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Target platform of a cook
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Platform {
    #[default]
    PC,
    IOS,
    Android,
    Linux,
}

impl Platform {
    /// Name of the generated source folder for this platform, e.g. `GeneratedPC`
    pub fn generated_folder(self) -> String {
        format!("Generated{}", self)
    }
}
