//! Finding and loading the notebooks of a site.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::notebook::Notebook;
use crate::schema::Schema;

pub const NOTEBOOK_EXT: &str = "ipynb";

/// Every notebook found in one directory.
#[derive(Debug, Default)]
pub struct Catalog {
    pub notebooks: Vec<Arc<Notebook>>,
    /// Files that looked like notebooks but could not be loaded.
    pub unreadable: Vec<Unreadable>,
}

#[derive(Debug, Clone)]
pub struct Unreadable {
    pub filename: Arc<str>,
    pub error: Error,
}

/// Lists the notebook files directly inside `dir`, sorted by file name.
///
/// Hidden files and files whose name is in `ignore` are skipped.
pub fn list(dir: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return err! {
            "notebook directory does not exist",
            "path" => dir.display(),
        };
    }

    let walker = jwalk::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort(true)
        .skip_hidden(true);

    let mut paths = vec![];
    for entry in walker {
        let entry = entry?;
        let name = entry.file_name.to_string_lossy();
        let is_notebook = entry.file_type.is_file()
            && Path::new(&*name).extension().map_or(false, |ext| ext == NOTEBOOK_EXT);

        if is_notebook && !ignore.iter().any(|ignored| *ignored == name) {
            paths.push(entry.path());
        }
    }

    Ok(paths)
}

impl Catalog {
    /// Loads every notebook in `dir` against `schema`.
    ///
    /// A notebook that fails to load is recorded in `unreadable`; it never
    /// fails the whole discovery.
    pub fn discover(dir: &Path, ignore: &[String], schema: Arc<Schema>) -> Result<Catalog> {
        let paths = list(dir, ignore)?;
        let loaded: Vec<_> = paths.par_iter()
            .map(|path| (path, Notebook::open(path, schema.clone())))
            .collect();

        let mut catalog = Catalog::default();
        for (path, result) in loaded {
            match result {
                Ok(notebook) => catalog.notebooks.push(Arc::new(notebook)),
                Err(error) => {
                    let filename = path.file_name()
                        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());

                    tracing::warn!(notebook = %filename, "skipping unreadable notebook");
                    catalog.unreadable.push(Unreadable { filename: filename.into(), error });
                }
            }
        }

        tracing::debug!(found = catalog.notebooks.len(), dir = %dir.display(), "loaded notebooks");
        Ok(catalog)
    }

    pub fn valid(&self) -> impl Iterator<Item = &Arc<Notebook>> {
        self.notebooks.iter().filter(|nb| nb.is_valid())
    }

    pub fn invalid(&self) -> impl Iterator<Item = &Arc<Notebook>> {
        self.notebooks.iter().filter(|nb| !nb.is_valid())
    }

    pub fn get(&self, filename: &str) -> Option<&Arc<Notebook>> {
        self.notebooks.iter().find(|nb| &*nb.filename == filename)
    }
}
