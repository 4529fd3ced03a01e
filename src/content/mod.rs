// src/content/mod.rs

//! Content identities and the source tree they come from

mod file_path;
mod file_type;
mod paths;
mod platform;
mod source_files;

pub use file_path::FilePath;
pub use file_type::FileType;
pub use paths::ContentPaths;
pub use platform::Platform;
pub use source_files::SourceFiles;
