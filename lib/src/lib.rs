#![doc = svgbobdoc::transform!(
//! Extract, validate and publish the metadata of notebook documents.
//!
//! # Overview
//!
//! A published notebook follows a convention: its first cells hold a title, an
//! author line, a description and a few bullet lists, and somewhere in its
//! outputs there is an image to use as a thumbnail. This crate finds that
//! metadata, checks it against the convention, and reports precisely what is
//! missing or malformed and how to fix it.
//!
//! ```svgbob
//!   +----------+      +----------+      +-------+      +----------+
//!   | .ipynb   +----->| Notebook +----->| Field +----->| Renderer |
//!   +----------+      +-----+----+      +---+---+      +----------+
//!                           |               |
//!                      +----+---+    +------+-----------------+
//!                      | Schema |    | locate, clean, validate|
//!                      +--------+    +------------------------+
//! ```
//!
//! In words:
//!
//!   * A [`Schema`](schema::Schema) is an ordered list of
//!     [`FieldSpec`](field::FieldSpec)s. Each spec names a piece of metadata,
//!     says where it lives with a [`Query`](query::Query), how to read it with
//!     a [`Shape`](field::Shape), and which [`Step`](field::Step)s clean and
//!     validate it.
//!
//!   * A [`Notebook`](notebook::Notebook) binds a schema to one parsed
//!     document. Fields are evaluated lazily and at most once. Every failure
//!     is a [`FieldError`](field::FieldError) that says whether the value was
//!     _absent_, had the wrong _shape_, or broke a _format_ rule, usually with
//!     a suggested replacement.
//!
//!   * [`Notebook::validate()`](notebook::Notebook::validate) collects the
//!     errors of every field into one [`ValidationReport`](field::ValidationReport).
//!
//! ## Rendering
//!
//! A site is typically built as follows:
//!
//! 1. Notebooks in a directory are loaded into a [`Catalog`](source::Catalog).
//!    Files that are not JSON are recorded, not fatal.
//! 2. A [`Renderer`](render::Renderer) renders an index page, one page per
//!    notebook and an error report through a templating
//!    [`Engine`](templating::Engine).
//! 3. Static assets are copied (and SCSS compiled) into the output directory.
)]

#[macro_use]
pub mod error;
pub mod query;
pub mod field;
pub mod schema;
pub mod notebook;
pub mod source;
pub mod markdown;
pub mod templating;
pub mod assets;
pub mod render;
pub mod util;

#[cfg(test)]
mod fixtures;

pub use field::{FieldError, FieldErrorKind, FieldSpec, FieldValue, ValidationReport};
pub use notebook::Notebook;
pub use render::Renderer;
pub use schema::Schema;
pub use source::Catalog;
