// src/content/source_files.rs

//! Per-type index of every cookable source file known to a run

use super::file_path::FilePath;
use super::file_type::FileType;
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct SourceFiles {
    by_type: HashMap<FileType, Vec<FilePath>>,
    filter: HashSet<FilePath>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `source_dir` and index every cookable file under it
    pub fn gather(source_dir: &Path) -> Result<Self> {
        let mut relative = Vec::new();
        for entry in WalkDir::new(source_dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::Environment(format!(
                    "Failed enumerating source directory {}: {}",
                    source_dir.display(),
                    e
                ))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(source_dir) {
                relative.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }

        let mut files = Self::new();
        files.amend(&relative)?;
        debug!(
            "Indexed {} cookable source file(s) under {}",
            files.filter.len(),
            source_dir.display()
        );
        Ok(files)
    }

    /// Add content-relative paths to the index
    ///
    /// Unknown or non-cooked extensions are skipped; an invalid content path
    /// is an error. Textures are indexed under every texture variant.
    pub fn amend<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<()> {
        for raw in paths {
            let raw = raw.as_ref();
            let Some(file_type) = source_type_of(raw) else {
                continue;
            };
            if !file_type.needs_cooking() {
                continue;
            }

            let path = FilePath::parse(raw)?;
            if !self.filter.insert(path.clone()) {
                continue;
            }

            for variant in variants_of(&path) {
                self.by_type.entry(variant.file_type()).or_default().push(variant);
            }
        }
        Ok(())
    }

    /// Remove content-relative paths from the index
    pub fn remove<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<()> {
        for raw in paths {
            let raw = raw.as_ref();
            if source_type_of(raw).is_none() {
                continue;
            }

            let path = FilePath::parse(raw)?;
            if !self.filter.remove(&path) {
                continue;
            }

            for variant in variants_of(&path) {
                if let Some(list) = self.by_type.get_mut(&variant.file_type()) {
                    list.retain(|p| p != &variant);
                }
            }
        }
        Ok(())
    }

    pub fn of_type(&self, file_type: FileType) -> &[FilePath] {
        self.by_type.get(&file_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, path: &FilePath) -> bool {
        self.filter.contains(path)
    }

    pub fn len(&self) -> usize {
        self.filter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
    }
}

fn source_type_of(raw: &str) -> Option<FileType> {
    Path::new(raw)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileType::from_source_extension)
}

fn variants_of(path: &FilePath) -> Vec<FilePath> {
    if path.file_type().is_texture() {
        FileType::texture_variants().map(|t| path.with_type(t)).collect()
    } else {
        vec![path.clone()]
    }
}
