// src/content/file_type.rs

//! Content file kinds and their source/cooked extensions

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Kind of a content file
///
/// Texture variants are declared contiguously so a task can claim the whole
/// `FIRST_TEXTURE..=LAST_TEXTURE` range.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum FileType {
    Csv,
    Font,
    Json,
    SceneAsset,
    Script,
    Text,
    Texture0,
    Texture1,
    Texture2,
    Texture3,
    Texture4,
    UiMovie,
    Xml,
}

impl FileType {
    pub const FIRST_TEXTURE: FileType = FileType::Texture0;
    pub const LAST_TEXTURE: FileType = FileType::Texture4;

    /// Every type a cook task produces output for
    pub const COOKABLE: [FileType; 9] = [
        FileType::Font,
        FileType::SceneAsset,
        FileType::Script,
        FileType::Texture0,
        FileType::Texture1,
        FileType::Texture2,
        FileType::Texture3,
        FileType::Texture4,
        FileType::UiMovie,
    ];

    /// Extension of the authored file, without the leading dot
    pub fn source_extension(self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Font => "ttf",
            FileType::Json => "json",
            FileType::SceneAsset => "fbx",
            FileType::Script => "lua",
            FileType::Text => "txt",
            FileType::Texture0
            | FileType::Texture1
            | FileType::Texture2
            | FileType::Texture3
            | FileType::Texture4 => "png",
            FileType::UiMovie => "swf",
            FileType::Xml => "xml",
        }
    }

    /// Extension of the cooked file, without the leading dot
    pub fn cooked_extension(self) -> &'static str {
        match self {
            FileType::Font => "sff",
            FileType::SceneAsset => "ssa",
            FileType::Script => "lbc",
            FileType::Texture0 => "sif0",
            FileType::Texture1 => "sif1",
            FileType::Texture2 => "sif2",
            FileType::Texture3 => "sif3",
            FileType::Texture4 => "sif4",
            FileType::UiMovie => "fcn",
            other => other.source_extension(),
        }
    }

    /// Resolve a type from a source file extension
    ///
    /// Texture sources map to `Texture0`; callers that need every variant
    /// expand through [`FileType::texture_variants`].
    pub fn from_source_extension(ext: &str) -> Option<FileType> {
        let ext = ext.to_ascii_lowercase();
        let found = match ext.as_str() {
            "csv" => FileType::Csv,
            "ttf" => FileType::Font,
            "json" => FileType::Json,
            "fbx" => FileType::SceneAsset,
            "lua" => FileType::Script,
            "txt" => FileType::Text,
            "png" => FileType::Texture0,
            "swf" => FileType::UiMovie,
            "xml" => FileType::Xml,
            _ => return None,
        };
        Some(found)
    }

    /// Resolve a type from either a source or a cooked extension
    pub fn from_extension(ext: &str) -> Option<FileType> {
        if let Some(found) = Self::from_source_extension(ext) {
            return Some(found);
        }
        let ext = ext.to_ascii_lowercase();
        Self::COOKABLE
            .iter()
            .copied()
            .find(|t| t.cooked_extension() == ext)
    }

    pub fn needs_cooking(self) -> bool {
        Self::COOKABLE.contains(&self)
    }

    pub fn is_texture(self) -> bool {
        (Self::FIRST_TEXTURE..=Self::LAST_TEXTURE).contains(&self)
    }

    /// True when freshness is a plain timestamp comparison between one source
    /// and one cooked file
    pub fn is_one_to_one(self) -> bool {
        !matches!(self, FileType::UiMovie)
    }

    pub fn texture_variants() -> impl Iterator<Item = FileType> {
        Self::range(Self::FIRST_TEXTURE, Self::LAST_TEXTURE)
    }

    /// All types in `[first, last]`, in declaration order
    pub fn range(first: FileType, last: FileType) -> impl Iterator<Item = FileType> {
        use strum::IntoEnumIterator;
        FileType::iter().filter(move |t| (first..=last).contains(t))
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_texture_range_is_contiguous() {
        let variants: Vec<_> = FileType::texture_variants().collect();
        assert_eq!(variants.len(), 5);
        assert_eq!(variants[0], FileType::Texture0);
        assert_eq!(variants[4], FileType::Texture4);
        assert!(variants.iter().all(|t| t.is_texture()));
        assert!(!FileType::UiMovie.is_texture());
    }

    #[test]
    fn test_extensions() {
        assert_eq!(FileType::Script.source_extension(), "lua");
        assert_eq!(FileType::Script.cooked_extension(), "lbc");
        assert_eq!(FileType::Texture3.cooked_extension(), "sif3");
        assert_eq!(FileType::Json.cooked_extension(), "json");
        assert_eq!(FileType::from_source_extension("PNG"), Some(FileType::Texture0));
        assert_eq!(FileType::from_extension("sif2"), Some(FileType::Texture2));
        assert_eq!(FileType::from_extension("exe"), None);
    }

    #[test]
    fn test_cooking_classification() {
        assert!(FileType::Font.needs_cooking());
        assert!(!FileType::Csv.needs_cooking());
        assert!(FileType::Script.is_one_to_one());
        assert!(!FileType::UiMovie.is_one_to_one());
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(FileType::SceneAsset.to_string(), "SceneAsset");
        assert_eq!(FileType::from_str("UiMovie").unwrap(), FileType::UiMovie);
        assert_eq!(FileType::Texture1.as_str(), "Texture1");
    }
}
