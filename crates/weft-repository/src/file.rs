//! File-based repository
//!
//! Stores each model as a pretty-printed JSON document at
//! `<root>/<KIND>/<id>.json`. Writes go to a temporary file in the same
//! directory which is then renamed over the target, so readers never observe
//! a partially written document.

use crate::error::{RepositoryError, Result};
use crate::model::{validate_model_id, Model};
use crate::traits::Repository;
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Repository persisting models as JSON files
#[derive(Debug)]
pub struct FileRepository<M> {
    dir: PathBuf,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> FileRepository<M> {
    /// Create repository rooted at `root`
    ///
    /// The kind directory is created lazily on first save.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(M::KIND),
            _model: PhantomData,
        }
    }

    /// Directory holding the documents of this kind
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, id: &str) -> Result<PathBuf> {
        let id = validate_model_id(id)?;
        Ok(self.dir.join(format!("{id}.{EXTENSION}")))
    }

    fn read_document(&self, path: &Path, id: &str) -> Result<Option<M>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RepositoryError::io(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| RepositoryError::Serialization {
                kind: M::KIND,
                id: id.to_string(),
                source,
            })
    }

    /// Paths of every stored document, sorted
    fn document_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::io(&self.dir, e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| RepositoryError::io(&self.dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl<M: Model> Repository<M> for FileRepository<M> {
    fn save(&self, model: &M) -> Result<()> {
        let id = model.model_id();
        let path = self.path_of(id)?;
        fs::create_dir_all(&self.dir).map_err(|e| RepositoryError::io(&self.dir, e))?;

        let document =
            serde_json::to_vec_pretty(model).map_err(|source| RepositoryError::Serialization {
                kind: M::KIND,
                id: id.to_string(),
                source,
            })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| RepositoryError::io(&self.dir, e))?;
        tmp.write_all(&document)
            .map_err(|e| RepositoryError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| RepositoryError::io(&path, e.error))?;

        tracing::debug!(kind = M::KIND, %id, "Saved model");
        Ok(())
    }

    fn load(&self, id: &str) -> Result<M> {
        let path = self.path_of(id)?;
        self.read_document(&path, id)?
            .ok_or_else(|| RepositoryError::not_found(M::KIND, id))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_of(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(kind = M::KIND, %id, "Deleted model");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RepositoryError::not_found(M::KIND, id)),
            Err(e) => Err(RepositoryError::io(&path, e)),
        }
    }

    fn delete_all(&self) -> Result<()> {
        let paths = self.document_paths()?;
        let count = paths.len();
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(RepositoryError::io(&path, e)),
            }
        }
        tracing::debug!(kind = M::KIND, count, "Deleted all models");
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<M>> {
        let mut models = Vec::new();
        for path in self.document_paths()? {
            let id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            // Deleted concurrently since listing
            if let Some(model) = self.read_document(&path, &id)? {
                models.push(model);
            }
        }
        Ok(models)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let path = self.path_of(id)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RepositoryError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        value: u32,
    }

    impl Model for Item {
        const KIND: &'static str = "item";

        fn model_id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str, value: u32) -> Item {
        Item {
            id: id.to_string(),
            value,
        }
    }

    #[test]
    fn documents_live_under_kind_directory() {
        let root = tempfile::tempdir().unwrap();
        let repo = FileRepository::<Item>::new(root.path());
        repo.save(&item("a", 1)).unwrap();

        let path = root.path().join("item").join("a.json");
        assert!(path.is_file());
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\"value\": 1"));
    }

    #[test]
    fn no_temporary_files_left_behind() {
        let root = tempfile::tempdir().unwrap();
        let repo = FileRepository::<Item>::new(root.path());
        repo.save(&item("a", 1)).unwrap();
        repo.save(&item("a", 2)).unwrap();

        let names: Vec<_> = fs::read_dir(repo.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.json")]);
    }

    #[test]
    fn missing_kind_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let repo = FileRepository::<Item>::new(root.path());
        assert!(repo.get_all().unwrap().is_empty());
        assert!(!repo.exists("a").unwrap());
        repo.delete_all().unwrap();
    }

    #[test]
    fn corrupted_document_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let repo = FileRepository::<Item>::new(root.path());
        fs::create_dir_all(repo.dir()).unwrap();
        fs::write(repo.dir().join("bad.json"), b"{ not json").unwrap();

        let err = repo.load("bad").unwrap_err();
        assert!(matches!(err, RepositoryError::Serialization { .. }));
    }

    #[test]
    fn invalid_ids_are_rejected_before_io() {
        let root = tempfile::tempdir().unwrap();
        let repo = FileRepository::<Item>::new(root.path());
        assert!(matches!(repo.load("../x"), Err(RepositoryError::InvalidId(_))));
        assert!(matches!(repo.save(&item("a/b", 1)), Err(RepositoryError::InvalidId(_))));
    }
}
