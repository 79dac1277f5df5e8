//! Font catalog over a directory of font files
//!
//! The compiler's view of fonts is deliberately thin: a face key (the
//! font file's stem, which is what style tables and the raster tool
//! both speak), a display family name, and the file path. The `fontdb`
//! crate does the actual discovery and header parsing; this crate just
//! flattens its database into that three-field view and implements the
//! [`FontCatalog`] contract on top.

use std::path::Path;

use log::{debug, info};

use textmesh_core::error::{Result, TextmeshError};
use textmesh_core::traits::FontCatalog;
use textmesh_core::types::FaceInfo;

#[derive(Debug)]
pub struct DirectoryCatalog {
    faces: Vec<FaceInfo>,
}

impl DirectoryCatalog {
    /// Scan `dir` for font files.
    ///
    /// Faces are keyed by file stem; a collection file contributing
    /// several faces keeps only its first, since one key can only name
    /// one face. The catalog is sorted by key so its order never
    /// depends on directory iteration order.
    pub fn scan(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(TextmeshError::MissingResource(format!(
                "font directory {} does not exist",
                dir.display()
            )));
        }

        let mut db = fontdb::Database::new();
        db.load_fonts_dir(dir);

        let mut faces: Vec<FaceInfo> = Vec::new();
        for face in db.faces() {
            let path = match &face.source {
                fontdb::Source::File(path) => path.clone(),
                fontdb::Source::SharedFile(path, _) => path.clone(),
                fontdb::Source::Binary(_) => continue,
            };
            let Some(stem) = path.file_stem() else {
                continue;
            };
            let key = stem.to_string_lossy().into_owned();
            if faces.iter().any(|known| known.key == key) {
                debug!("face key '{key}' already taken; skipping extra face");
                continue;
            }
            let family = face
                .families
                .first()
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| key.clone());
            faces.push(FaceInfo { key, family, path });
        }

        faces.sort_by(|a, b| a.key.cmp(&b.key));
        info!("font catalog: {} face(s) from {}", faces.len(), dir.display());
        Ok(Self { faces })
    }
}

impl FontCatalog for DirectoryCatalog {
    fn faces(&self) -> &[FaceInfo] {
        &self.faces
    }

    fn by_key(&self, key: &str) -> Option<&FaceInfo> {
        self.faces.iter().find(|face| face.key == key)
    }

    fn by_family(&self, family: &str) -> Option<&FaceInfo> {
        self.faces.iter().find(|face| face.family == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("textmesh_fontdb_{tag}_{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_directory_is_a_missing_resource() {
        let err = DirectoryCatalog::scan(Path::new("/nonexistent/fonts")).unwrap_err();
        assert!(matches!(err, TextmeshError::MissingResource(_)));
    }

    #[test]
    fn empty_directory_yields_an_empty_catalog() {
        let dir = temp_dir("empty");
        let catalog = DirectoryCatalog::scan(&dir).unwrap();
        assert!(catalog.faces().is_empty());
        assert!(catalog.by_key("SomeFace").is_none());
        assert!(catalog.by_family("Some Family").is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn non_font_files_are_ignored() {
        let dir = temp_dir("junk");
        std::fs::write(dir.join("notes.txt"), "not a font").unwrap();
        let catalog = DirectoryCatalog::scan(&dir).unwrap();
        assert!(catalog.faces().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
