// src/content/paths.rs

//! Resolution of content identities to on-disk locations

use super::file_path::FilePath;
use super::platform::Platform;
use std::path::{Path, PathBuf};

/// Root directories of one cook run
///
/// Source files live under `source_dir`; cooked files under
/// `content_dir/<Platform>`.
#[derive(Debug, Clone)]
pub struct ContentPaths {
    source_dir: PathBuf,
    content_dir: PathBuf,
    platform: Platform,
}

impl ContentPaths {
    pub fn new(source_dir: impl Into<PathBuf>, content_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            source_dir: source_dir.into(),
            content_dir: content_dir.into(),
            platform,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Root of the cooked output tree for the run's platform
    pub fn platform_content_dir(&self) -> PathBuf {
        self.content_dir.join(self.platform.to_string())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn source_path(&self, path: &FilePath) -> PathBuf {
        self.source_dir.join(path.relative_source())
    }

    pub fn cooked_path(&self, path: &FilePath) -> PathBuf {
        self.platform_content_dir().join(path.relative_cooked())
    }

    /// `Source/Generated<Platform>` for the run's platform
    pub fn generated_source_dir(&self) -> PathBuf {
        self.source_dir.join(self.platform.generated_folder())
    }

    /// True if a source path sits in another platform's generated folder
    ///
    /// Files under `Generated*` are only visible to the matching platform or
    /// when they live in `GeneratedLocal`.
    pub fn is_excluded(&self, path: &FilePath) -> bool {
        let Some(rest) = path.relative().strip_prefix("Generated") else {
            return false;
        };
        let rest = rest.to_ascii_lowercase();
        let platform = self.platform.to_string().to_ascii_lowercase();
        !(rest.starts_with(&platform) || rest.starts_with("local"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution() {
        let paths = ContentPaths::new("/game/Source", "/game/Content", Platform::PC);
        let path = FilePath::parse("Scripts/Main.lua").unwrap();
        assert_eq!(paths.source_path(&path), PathBuf::from("/game/Source/Scripts/Main.lua"));
        assert_eq!(paths.cooked_path(&path), PathBuf::from("/game/Content/PC/Scripts/Main.lbc"));
        assert_eq!(paths.generated_source_dir(), PathBuf::from("/game/Source/GeneratedPC"));
    }

    #[test]
    fn test_generated_exclusion() {
        let paths = ContentPaths::new("/s", "/c", Platform::IOS);
        let own = FilePath::parse("GeneratedIOS/UIImages/Menu/Button.png").unwrap();
        let local = FilePath::parse("GeneratedLocal/Scripts/Config.lua").unwrap();
        let other = FilePath::parse("GeneratedAndroid/UIImages/Menu/Button.png").unwrap();
        let normal = FilePath::parse("Textures/Button.png").unwrap();

        assert!(!paths.is_excluded(&own));
        assert!(!paths.is_excluded(&local));
        assert!(paths.is_excluded(&other));
        assert!(!paths.is_excluded(&normal));
    }
}
