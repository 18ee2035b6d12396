pub mod minijinja;

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::notebook::Notebook;
use crate::source::Catalog;

pub use self::minijinja::MiniJinjaEngine;

/// The data a template is rendered with.
///
/// Site globals are not part of the context; engines make them available to
/// every template as `site`.
#[derive(Debug, Clone)]
pub enum Context {
    /// A single notebook's page: `notebook`.
    Notebook(Arc<Notebook>),
    /// A page over the whole catalog: `notebooks`, `valid_notebooks`,
    /// `invalid_notebooks` and `unreadable`.
    Catalog(Arc<Catalog>),
}

pub trait Engine: Send + Sync + Debug {
    /// Renders the template `name` with `context`.
    fn render(&self, name: &str, context: &Context) -> Result<String>;
}
