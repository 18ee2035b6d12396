use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Event, EventKind, RecursiveMode, Watcher};

use nbsite::error;
use nbsite::error::{Chainable, Error, Result};
use nbsite::source::NOTEBOOK_EXT;

use crate::config::Settings;
use crate::render::Gallery;

/// How long the file system must stay quiet before a rebuild starts.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

type Events = Receiver<notify::Result<Event>>;

/// The directories a build reads from, as the watcher reports them.
#[derive(Debug)]
pub struct Watched {
    notebooks: PathBuf,
    templates: PathBuf,
    static_dir: PathBuf,
}

impl Watched {
    pub fn new(settings: &Settings) -> Watched {
        let resolve = |dir: &Path| dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        Watched {
            notebooks: resolve(&settings.notebooks),
            templates: resolve(&settings.templates),
            static_dir: resolve(&settings.static_dir),
        }
    }

    /// Notebooks directly inside the notebook directory, and anything under
    /// the template and static directories.
    pub fn affects(&self, path: &Path) -> bool {
        let is_notebook = path.parent() == Some(self.notebooks.as_path())
            && path.extension().map_or(false, |ext| ext == NOTEBOOK_EXT);

        is_notebook || path.starts_with(&self.templates) || path.starts_with(&self.static_dir)
    }

    pub fn register<W: Watcher>(&self, watcher: &mut W) -> Result<()> {
        let dirs = [
            (&self.notebooks, RecursiveMode::NonRecursive),
            (&self.templates, RecursiveMode::Recursive),
            (&self.static_dir, RecursiveMode::Recursive),
        ];

        for (dir, mode) in dirs {
            if !dir.is_dir() {
                tracing::warn!("not watching {}: no such directory", dir.display());
                continue;
            }

            watcher.watch(dir, mode)
                .map_err(Error::from_std)
                .chain_with(|| error!("failed to watch directory", "path" => dir.display()))?;
        }

        Ok(())
    }

    fn record(&self, event: notify::Result<Event>, changes: &mut BTreeSet<PathBuf>) {
        match event {
            Ok(event) if matches!(event.kind, EventKind::Access(_)) => {}
            Ok(event) => changes.extend(event.paths.into_iter().filter(|p| self.affects(p))),
            Err(e) => tracing::warn!("file watcher error: {e}"),
        }
    }

    /// Blocks until a change affects the site, then keeps collecting until
    /// the events pause for `quiet`. Returns `None` once the watcher is gone.
    pub fn next_change(&self, events: &Events, quiet: Duration) -> Option<BTreeSet<PathBuf>> {
        let mut changes = BTreeSet::new();
        while changes.is_empty() {
            self.record(events.recv().ok()?, &mut changes);
        }

        loop {
            match events.recv_timeout(quiet) {
                Ok(event) => self.record(event, &mut changes),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                    return Some(changes);
                }
            }
        }
    }
}

fn build(settings: &Settings) {
    match Gallery::new(settings.clone()) {
        Ok(gallery) => if let Err(e) = gallery.build() {
            tracing::error!("build failed: {e}");
        },
        Err(e) => tracing::error!("build failed: {e}"),
    }
}

/// Builds the site, then rebuilds it whenever a file it is built from changes.
///
/// The watcher is registered before the first build, so edits made while a
/// build runs trigger the next one. Each build starts from scratch with a
/// fresh [`Gallery`], so template edits are picked up too. Failed builds are
/// logged.
pub fn watch(settings: Settings) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx)
        .map_err(Error::from_std)
        .chain_with(|| error!("failed to start the file watcher"))?;

    let watched = Watched::new(&settings);
    watched.register(&mut watcher)?;

    build(&settings);
    tracing::info!("watching for changes...");
    while let Some(changes) = watched.next_change(&rx, DEBOUNCE) {
        for path in &changes {
            tracing::info!("file changed: {}", path.display());
        }

        build(&settings);
    }

    Ok(())
}
