use std::sync::Arc;

use rayon::prelude::*;

use crate::error::Result;
use crate::notebook::Notebook;
use crate::source::Catalog;

/// Writes a site from a loaded [`Catalog`].
///
/// Implementors supply the pages; [`Renderer::render_site()`] runs them all,
/// notebook pages in parallel with the rest.
pub trait Renderer: Sync {
    fn render_index(&self, catalog: &Arc<Catalog>) -> Result<()>;

    fn render_notebook(&self, catalog: &Arc<Catalog>, notebook: &Arc<Notebook>) -> Result<()>;

    fn render_errors(&self, catalog: &Arc<Catalog>) -> Result<()>;

    fn copy_static(&self) -> Result<()>;

    #[inline(always)]
    fn render_site(&self, catalog: &Arc<Catalog>) -> Result<()> {
        render_site(self, catalog)
    }
}

/// Renders every page of `catalog` and copies static assets.
///
/// Every part runs even if another fails; all failures are chained into the
/// returned error.
pub fn render_site<R>(renderer: &R, catalog: &Arc<Catalog>) -> Result<()>
    where R: Renderer + ?Sized
{
    let (pages, rest) = rayon::join(
        || catalog.notebooks.par_iter()
            .map(|notebook| renderer.render_notebook(catalog, notebook))
            .reduce(|| Ok(()), merge),
        || {
            let (index, errors) = rayon::join(
                || renderer.render_index(catalog),
                || renderer.render_errors(catalog),
            );

            merge(merge(index, errors), renderer.copy_static())
        }
    );

    merge(pages, rest)
}

fn merge(a: Result<()>, b: Result<()>) -> Result<()> {
    match (a, b) {
        (Ok(_), Ok(_)) => Ok(()),
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => Err(e),
        (Err(e1), Err(e2)) => Err(e1.chain(e2)),
    }
}
