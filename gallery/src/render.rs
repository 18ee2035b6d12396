use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;

use nbsite::error::{Chainable, Error, Result};
use nbsite::field::ImageKinds;
use nbsite::templating::{Context, Engine, MiniJinjaEngine};
use nbsite::{assets, error, util, Catalog, Notebook, Renderer, Schema};

use crate::config::Settings;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const NOTEBOOK_TEMPLATE: &str = "notebook.html";
pub const ERRORS_TEMPLATE: &str = "errors.html";

#[derive(Debug)]
pub struct Gallery {
    pub settings: Settings,
    engine: Arc<dyn Engine>,
    schema: Arc<Schema>,
}

/// What a build produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub valid: usize,
    pub invalid: usize,
    pub unreadable: usize,
}

impl Gallery {
    pub fn new(settings: Settings) -> Result<Self> {
        let engine = MiniJinjaEngine::new(&settings.templates, &settings.globals, &settings.root)?;
        let schema = Schema::notebook(ImageKinds::default())?;
        Ok(Gallery { settings, engine: Arc::new(engine), schema: Arc::new(schema) })
    }

    pub fn discover(&self) -> Result<Catalog> {
        let settings = &self.settings;
        Catalog::discover(&settings.notebooks, &settings.ignore, self.schema.clone())
    }

    /// Loads every notebook and writes the whole site.
    pub fn build(&self) -> Result<Summary> {
        tracing::info!("building in {}", self.settings.output.display());

        let start = Instant::now();
        let catalog = Arc::new(self.discover()?);
        tracing::info!("discovery time: {}ms", start.elapsed().as_millis());

        let summary = Summary {
            valid: catalog.valid().count(),
            invalid: catalog.invalid().count(),
            unreadable: catalog.unreadable.len(),
        };

        for notebook in catalog.invalid() {
            if let Err(report) = notebook.validate() {
                tracing::warn!("{}", Error::from(report));
            }
        }

        let mut slugs = FxHashMap::default();
        for notebook in &catalog.notebooks {
            if let Some(other) = slugs.insert(notebook.slug.clone(), notebook.filename.clone()) {
                tracing::warn!(
                    slug = %notebook.slug,
                    "`{}` and `{}` share a page; only one will be published",
                    other, notebook.filename
                );
            }
        }

        let render = Instant::now();
        self.render_site(&catalog)?;
        tracing::info!("render time: {}ms", render.elapsed().as_millis());
        tracing::info!(
            valid = summary.valid,
            invalid = summary.invalid,
            unreadable = summary.unreadable,
            "{} notebooks found", catalog.notebooks.len()
        );

        Ok(summary)
    }

    fn write<P: AsRef<Path>>(&self, template: &str, dest: P, context: Context) -> Result<()> {
        let dest = dest.as_ref();
        let html = self.engine.render(template, &context).chain_with(|| error! {
            "failed to render page",
            "page" => dest.display(),
            "template used" => template,
        })?;

        util::write_file(self.settings.output.join(dest), html)
    }
}

impl Renderer for Gallery {
    fn render_index(&self, catalog: &Arc<Catalog>) -> Result<()> {
        self.write(INDEX_TEMPLATE, "index.html", Context::Catalog(catalog.clone()))
    }

    fn render_notebook(&self, _: &Arc<Catalog>, notebook: &Arc<Notebook>) -> Result<()> {
        let page = format!("{}.html", notebook.slug);
        self.write(NOTEBOOK_TEMPLATE, page, Context::Notebook(notebook.clone()))
    }

    fn render_errors(&self, catalog: &Arc<Catalog>) -> Result<()> {
        self.write(ERRORS_TEMPLATE, "errors.html", Context::Catalog(catalog.clone()))
    }

    fn copy_static(&self) -> Result<()> {
        let output = self.settings.output.join("static");
        let count = assets::copy_dir(&self.settings.static_dir, &output)?;
        tracing::debug!(count, "copied static files");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn site_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../site")
    }

    fn notebook(title: &str, image: bool) -> String {
        let outputs = match image {
            true => r#"[{ "data": { "image/png": "iVBORw0KGgo=" } }]"#,
            false => "[]",
        };

        format!(r####"{{ "cells": [
            {{ "cell_type": "markdown", "source": ["{title}\n"] }},
            {{ "cell_type": "markdown", "source": ["## Author: Jane Doe"] }},
            {{ "cell_type": "markdown", "source": ["Some *waves*."] }},
            {{ "cell_type": "markdown", "source": ["### References\n", "- A\n"] }},
            {{ "cell_type": "markdown", "source": ["### Keywords\n", "- waves, sound\n"] }},
            {{ "cell_type": "markdown", "source": ["### Requirements\n", "- numpy\n"] }},
            {{ "cell_type": "code", "source": [], "outputs": {outputs} }}
        ] }}"####)
    }

    #[test]
    fn builds_the_bundled_site() {
        let notebooks = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(notebooks.path().join("Waves.ipynb"), notebook("# Waves", true)).unwrap();
        fs::write(notebooks.path().join("broken.ipynb"), notebook("## Broken", false)).unwrap();
        fs::write(notebooks.path().join("garbage.ipynb"), "{").unwrap();
        fs::write(notebooks.path().join("skip.ipynb"), "{").unwrap();

        let settings = Settings {
            notebooks: notebooks.path().into(),
            output: output.path().into(),
            templates: site_dir().join("templates"),
            static_dir: site_dir().join("static"),
            ignore: vec!["skip.ipynb".into()],
            ..Settings::parse(r#"title = "Test Gallery""#).unwrap()
        };

        let gallery = Gallery::new(settings).unwrap();
        let summary = gallery.build().unwrap();
        assert_eq!(summary, Summary { valid: 1, invalid: 1, unreadable: 1 });

        let index = fs::read_to_string(output.path().join("index.html")).unwrap();
        assert!(index.contains("Test Gallery"));
        assert!(index.contains("waves.html"));
        assert!(!index.contains("broken.html"));

        let page = fs::read_to_string(output.path().join("waves.html")).unwrap();
        assert!(page.contains("Jane Doe"));
        assert!(page.contains("<em>waves</em>"));

        let errors = fs::read_to_string(output.path().join("errors.html")).unwrap();
        assert!(errors.contains("broken.ipynb"));
        assert!(errors.contains("garbage.ipynb"));
        assert!(errors.contains("# Broken"));

        assert!(output.path().join("broken.html").exists());
        assert!(output.path().join("static/style.css").exists());
    }

    #[test]
    fn missing_templates_fail_early() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings { templates: dir.path().join("nope"), ..Settings::default() };
        assert!(Gallery::new(settings).is_err());
    }
}
