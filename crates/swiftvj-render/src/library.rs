//! Shader directory indexing and rating-based selection.
//!
//! Mirrors the teacher's directory-scanning media library
//! (`mapmap-core::media_library::MediaLibrary::refresh`) with a `walkdir`
//! traversal, but ratings here are supplied by the caller rather than
//! inferred from file extension - the rating store itself is out of scope
//! (`SPEC_FULL.md` §4.4).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use swiftvj_core::{ShaderInfo, ShaderRating};

use crate::{RenderError, Result};

/// Extensions accepted by the shader/mask directory scan, matched
/// case-insensitively.
const ACCEPTED_EXTENSIONS: &[&str] = &["glsl", "frag", "txt"];

/// Indexes a flat shader or mask directory.
pub struct ShaderLibrary;

impl ShaderLibrary {
    /// Walks `dir`, keeping files whose extension is one of
    /// [`ACCEPTED_EXTENSIONS`], sorted by file-stem name. Every entry is
    /// assigned [`ShaderRating::Ok`] by default; callers that have an
    /// external rating store apply their own ratings with
    /// [`ShaderLibrary::apply_ratings`].
    pub fn index(dir: &Path) -> Result<Vec<ShaderInfo>> {
        let mut entries = Vec::new();
        let walker = WalkDir::new(dir).into_iter();
        for entry in walker {
            let entry = entry.map_err(|e| RenderError::ShaderDirectory {
                path: dir.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !ACCEPTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                continue;
            }
            let name = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
            entries.push(ShaderInfo { name, path: path.to_path_buf(), rating: ShaderRating::Ok });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Overwrites the rating of every entry whose name matches a key in
    /// `ratings`, leaving unmatched entries at their current rating.
    pub fn apply_ratings(entries: &mut [ShaderInfo], ratings: &std::collections::HashMap<String, ShaderRating>) {
        for entry in entries.iter_mut() {
            if let Some(rating) = ratings.get(&entry.name) {
                entry.rating = *rating;
            }
        }
    }
}

/// Owns an indexed shader library and the currently selected entry,
/// exposing cycling and rating-filtered iteration.
pub struct ShaderManager {
    entries: Vec<ShaderInfo>,
    selected: Option<usize>,
}

impl ShaderManager {
    /// Builds a manager from an already-indexed entry list, nothing
    /// selected (the tile renders the built-in default until a selection is
    /// made).
    pub fn new(entries: Vec<ShaderInfo>) -> Self {
        Self { entries, selected: None }
    }

    /// All indexed entries, in sorted order.
    pub fn entries(&self) -> &[ShaderInfo] {
        &self.entries
    }

    /// The currently selected entry, if any.
    pub fn current(&self) -> Option<&ShaderInfo> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    /// Selects by exact name match or by index (tried in that order); does
    /// nothing if neither resolves to an entry.
    pub fn select(&mut self, name_or_index: &str) {
        if let Some(pos) = self.entries.iter().position(|e| e.name == name_or_index) {
            self.selected = Some(pos);
            return;
        }
        if let Ok(index) = name_or_index.parse::<usize>() {
            if index < self.entries.len() {
                self.selected = Some(index);
            }
        }
    }

    /// Advances to the next entry, wrapping to the first. No-op on an empty
    /// library.
    pub fn next_shader(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) => (i + 1) % self.entries.len(),
            None => 0,
        });
    }

    /// Steps back to the previous entry, wrapping to the last. No-op on an
    /// empty library.
    pub fn prev_shader(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        });
    }

    /// Entries rated [`ShaderRating::Best`] or [`ShaderRating::Good`], in
    /// index order. Supplements the spec's "callers filter the list by
    /// rating" note (`spec.md` §4.4) with a ready-made convenience for the
    /// common "auto-cycle through the good stuff" use case.
    pub fn best_and_good(&self) -> impl Iterator<Item = &ShaderInfo> {
        self.entries.iter().filter(|e| matches!(e.rating, ShaderRating::Best | ShaderRating::Good))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_shader(dir: &Path, name: &str) {
        fs::write(dir.join(name), "vec3 mainImage(vec2 uv) { return vec3(0.0); }").unwrap();
    }

    #[test]
    fn index_accepts_only_known_extensions_and_sorts_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_shader(dir.path(), "zeta.glsl");
        write_shader(dir.path(), "alpha.frag");
        write_shader(dir.path(), "beta.txt");
        write_shader(dir.path(), "ignored.rs");

        let entries = ShaderLibrary::index(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "zeta"]);
        assert!(entries.iter().all(|e| e.rating == ShaderRating::Ok));
    }

    #[test]
    fn apply_ratings_overwrites_only_matching_names() {
        let dir = tempfile::tempdir().unwrap();
        write_shader(dir.path(), "alpha.glsl");
        write_shader(dir.path(), "beta.glsl");
        let mut entries = ShaderLibrary::index(dir.path()).unwrap();

        let mut ratings = std::collections::HashMap::new();
        ratings.insert("alpha".to_string(), ShaderRating::Best);
        ShaderLibrary::apply_ratings(&mut entries, &ratings);

        let alpha = entries.iter().find(|e| e.name == "alpha").unwrap();
        let beta = entries.iter().find(|e| e.name == "beta").unwrap();
        assert_eq!(alpha.rating, ShaderRating::Best);
        assert_eq!(beta.rating, ShaderRating::Ok);
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let dir = tempfile::tempdir().unwrap();
        write_shader(dir.path(), "a.glsl");
        write_shader(dir.path(), "b.glsl");
        let entries = ShaderLibrary::index(dir.path()).unwrap();
        let mut mgr = ShaderManager::new(entries);

        mgr.next_shader();
        assert_eq!(mgr.current().unwrap().name, "a");
        mgr.next_shader();
        assert_eq!(mgr.current().unwrap().name, "b");
        mgr.next_shader();
        assert_eq!(mgr.current().unwrap().name, "a");

        mgr.prev_shader();
        assert_eq!(mgr.current().unwrap().name, "b");
    }

    #[test]
    fn select_by_name_or_index() {
        let dir = tempfile::tempdir().unwrap();
        write_shader(dir.path(), "a.glsl");
        write_shader(dir.path(), "b.glsl");
        let entries = ShaderLibrary::index(dir.path()).unwrap();
        let mut mgr = ShaderManager::new(entries);

        mgr.select("b");
        assert_eq!(mgr.current().unwrap().name, "b");
        mgr.select("0");
        assert_eq!(mgr.current().unwrap().name, "a");
        mgr.select("nonexistent");
        assert_eq!(mgr.current().unwrap().name, "a");
    }

    #[test]
    fn best_and_good_filters_out_lower_ratings() {
        let dir = tempfile::tempdir().unwrap();
        write_shader(dir.path(), "a.glsl");
        write_shader(dir.path(), "b.glsl");
        write_shader(dir.path(), "c.glsl");
        let mut entries = ShaderLibrary::index(dir.path()).unwrap();
        entries[0].rating = ShaderRating::Best;
        entries[1].rating = ShaderRating::Skip;
        entries[2].rating = ShaderRating::Good;

        let mgr = ShaderManager::new(entries);
        let names: Vec<_> = mgr.best_and_good().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
