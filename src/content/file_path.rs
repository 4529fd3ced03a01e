// src/content/file_path.rs

//! Content identity: a content-relative path plus a file type
//!
//! A `FilePath` never owns file bytes. It stores the relative path without
//! extension (always `/`-separated) and the type tag, and resolves to a source
//! or cooked location through [`ContentPaths`](super::ContentPaths).

use super::file_type::FileType;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

/// Identity is the relative path and the type; the spelling of the source
/// extension is kept only to find the source file again
#[derive(Debug, Clone)]
pub struct FilePath {
    relative: Arc<str>,
    file_type: FileType,
    source_extension: Arc<str>,
}

impl FilePath {
    /// Parse and validate a content-relative path such as `UI/Menus/Main.swf`
    ///
    /// Both `/` and `\` are accepted as separators. The extension selects the
    /// type; it may be a source or a cooked extension.
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidContentPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("empty path"));
        }

        let normalized = path.replace('\\', "/");
        let (stem, ext) = match normalized.rsplit_once('.') {
            Some((stem, ext)) if !ext.contains('/') => (stem, ext),
            _ => return Err(invalid("missing extension")),
        };

        let file_type = FileType::from_extension(ext)
            .ok_or_else(|| invalid(&format!("unknown extension '{}'", ext)))?;

        validate_relative(stem).map_err(|reason| invalid(&reason))?;

        // Source files may be spelled `Main.LUA`; cooked extensions are ours
        let source_extension = if ext.eq_ignore_ascii_case(file_type.source_extension()) {
            Arc::from(ext)
        } else {
            Arc::from(file_type.source_extension())
        };

        Ok(Self {
            relative: Arc::from(stem),
            file_type,
            source_extension,
        })
    }

    /// Build an identity from a path relative to a root directory
    pub fn from_root_relative(root: &Path, path: &Path) -> Result<Self> {
        let relative = path.strip_prefix(root).map_err(|_| Error::InvalidContentPath {
            path: path.display().to_string(),
            reason: format!("not under {}", root.display()),
        })?;
        Self::parse(&relative.to_string_lossy())
    }

    /// Same path, different type
    pub fn with_type(&self, file_type: FileType) -> Self {
        let source_extension = if file_type.source_extension() == self.file_type.source_extension() {
            Arc::clone(&self.source_extension)
        } else {
            Arc::from(file_type.source_extension())
        };
        Self {
            relative: Arc::clone(&self.relative),
            file_type,
            source_extension,
        }
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Relative path without extension, `/`-separated
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Final path component without extension
    pub fn file_stem(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(_, stem)| stem)
            .unwrap_or(&self.relative)
    }

    /// Relative source path with extension as found on disk, e.g. `Scripts/Main.lua`
    pub fn relative_source(&self) -> String {
        format!("{}.{}", self.relative, self.source_extension)
    }

    /// Relative cooked path with extension, e.g. `Scripts/Main.lbc`
    pub fn relative_cooked(&self) -> String {
        format!("{}.{}", self.relative, self.file_type.cooked_extension())
    }
}

impl PartialEq for FilePath {
    fn eq(&self, other: &Self) -> bool {
        self.file_type == other.file_type && self.relative == other.relative
    }
}

impl Eq for FilePath {}

impl Hash for FilePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relative.hash(state);
        self.file_type.hash(state);
    }
}

impl Ord for FilePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.relative
            .cmp(&other.relative)
            .then(self.file_type.cmp(&other.file_type))
    }
}

impl PartialOrd for FilePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_cooked())
    }
}

/// Character rules for the extension-less part of a content path
fn validate_relative(stem: &str) -> std::result::Result<(), String> {
    if stem.is_empty() {
        return Err("empty file name".to_string());
    }

    let chars: Vec<char> = stem.chars().collect();
    let file_start = stem.rfind('/').map(|i| stem[..=i].chars().count()).unwrap_or(0);
    let last = chars.len() - 1;
    let mut prev: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '/' => {
                if prev == Some('/') {
                    return Err("contains a double slash".to_string());
                }
            }
            '{' => {
                if i != file_start {
                    return Err("'{' is only valid at the start of a file name".to_string());
                }
            }
            '}' => {
                if i != last {
                    return Err("'}' is only valid at the end of a file name".to_string());
                }
            }
            '.' | '-' | ' ' => {
                if i == 0 || i == file_start {
                    return Err(format!("starts with '{}'", c));
                }
                if i == last {
                    return Err(format!("ends with '{}'", c));
                }
                if let Some(p @ ('.' | '_' | '-' | ' ')) = prev {
                    return Err(format!("contains sequence '{}{}'", p, c));
                }
            }
            c if c == '_' || c.is_ascii_alphanumeric() => {}
            other => return Err(format!("contains invalid character '{}'", other)),
        }
        prev = Some(c);
    }

    Ok(())
}
