use std::path::Path;
use std::sync::Arc;

use minijinja::{path_loader, Environment};
use minijinja::value::Value;
use serde::Serialize;

use crate::error::{Chainable, Result};
use crate::templating::{Context, Engine};

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
    root: Arc<str>,
}

impl MiniJinjaEngine {
    /// An engine loading templates from `dir`.
    ///
    /// `globals` are available to every template as `site`. `root` is the URL
    /// prefix of every generated link; a trailing `/` is added if missing.
    pub fn new<P: AsRef<Path>, G: Serialize>(dir: P, globals: G, root: &str) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return err!("template directory does not exist", "path" => dir.display());
        }

        let root: Arc<str> = match root.ends_with('/') {
            true => root.into(),
            false => format!("{root}/").into(),
        };

        let mut env = Environment::new();
        env.set_loader(path_loader(dir));
        env.add_global("site", Value::from_serializable(&globals));
        env.add_global("root", Value::from(&*root));

        let icon_root = root.clone();
        env.add_function("icon", move |name: &str| ext::icon(&icon_root, name));
        env.add_function("now", ext::now);
        env.add_filter("markdown", ext::markdown);
        env.add_filter("markdown_inline", ext::markdown_inline);
        env.add_filter("slugify", ext::slugify);
        env.add_filter("date", ext::date);
        Ok(MiniJinjaEngine { env, root })
    }
}

impl Engine for MiniJinjaEngine {
    fn render(&self, name: &str, context: &Context) -> Result<String> {
        let template = self.env.get_template(name)
            .chain_with(|| error!("failed to load template", "template" => name))?;

        let root = self.root.clone();
        let context = match context {
            Context::Notebook(nb) => object::page(object::notebook(nb.clone(), root)),
            Context::Catalog(catalog) => object::catalog(catalog.clone(), root),
        };

        template.render(context)
            .chain_with(|| error!("failed to render template", "template" => name))
    }
}

mod ext {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use minijinja::{value::Value, Error, ErrorKind};

    use crate::{markdown, util};

    pub fn markdown(value: &str) -> Value {
        Value::from_safe_string(markdown::to_html(value))
    }

    pub fn markdown_inline(value: &str) -> Value {
        Value::from_safe_string(markdown::to_inline_html(value))
    }

    pub fn slugify(value: &str) -> String {
        util::slugify(value)
    }

    /// An inline SVG referencing `name` in the site's `static/icons.svg`
    /// sprite sheet.
    pub fn icon(root: &str, name: &str) -> Value {
        let name = util::slugify(name);
        Value::from_safe_string(format!(
            r#"<svg class="icon icon-{name}" aria-hidden="true"><use href="{root}static/icons.svg#{name}"></use></svg>"#
        ))
    }

    pub fn date(value: Value, fmt: &str) -> Result<Value, Error> {
        if let Ok(ts) = i64::try_from(value.clone()) {
            let datetime = DateTime::<Utc>::from_timestamp(ts, 0)
                .ok_or_else(|| Error::new(
                    ErrorKind::InvalidOperation,
                    "invalid timestamp provided to `date`"
                ))?;

            return Ok(datetime.format(fmt).to_string().into());
        }

        let kind = value.kind();
        let attr = value.get_attr("$__toml_private_datetime");
        let string = attr.as_ref()
            .ok()
            .and_then(|v| v.as_str())
            .or_else(|| value.as_str())
            .ok_or_else(|| Error::new(
                ErrorKind::InvalidOperation,
                format!("`date` must be applied to a string or integer, found {kind}")
            ))?;

        let datetime = string.parse::<NaiveDate>().map(|d| d.format(fmt))
            .or_else(|_| string.parse::<NaiveTime>().map(|t| t.format(fmt)))
            .or_else(|_| string.parse::<NaiveDateTime>().map(|dt| dt.format(fmt)))
            .or_else(|_| string.parse::<DateTime<Utc>>().map(|dt| dt.format(fmt)))
            .map_err(|e| Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to parse {string}: {e}")
            ))?;

        Ok(datetime.to_string().into())
    }

    pub fn now() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

mod object {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use minijinja::value::{StructObject, Value};
    use serde::Serialize;

    use crate::field::FieldError;
    use crate::notebook::Notebook;
    use crate::source::Catalog;

    const NOTEBOOK_FIELDS: &[&str] = &["filename", "slug", "url", "valid", "errors", "field_errors", "json"];
    const CATALOG_FIELDS: &[&str] = &["notebooks", "valid_notebooks", "invalid_notebooks", "unreadable"];

    struct NotebookObject {
        notebook: Arc<Notebook>,
        root: Arc<str>,
    }

    struct CatalogObject {
        catalog: Arc<Catalog>,
        root: Arc<str>,
    }

    /// The context of a single notebook's page.
    struct Page(Value);

    #[derive(Serialize)]
    struct UnreadableEntry<'a> {
        filename: &'a str,
        error: String,
    }

    pub fn notebook(notebook: Arc<Notebook>, root: Arc<str>) -> Value {
        Value::from_struct_object(NotebookObject { notebook, root })
    }

    pub fn catalog(catalog: Arc<Catalog>, root: Arc<str>) -> Value {
        Value::from_struct_object(CatalogObject { catalog, root })
    }

    pub fn page(notebook: Value) -> Value {
        Value::from_struct_object(Page(notebook))
    }

    impl StructObject for NotebookObject {
        fn get_field(&self, name: &str) -> Option<Value> {
            let nb = &self.notebook;
            let value = match name {
                "filename" => Value::from(&*nb.filename),
                "slug" => Value::from(&*nb.slug),
                "url" => Value::from_safe_string(format!("{}{}.html", self.root, nb.slug)),
                "valid" => Value::from(nb.is_valid()),
                "errors" => Value::from_serializable(&nb.errors().collect::<Vec<_>>()),
                "field_errors" => {
                    let errors: BTreeMap<&str, &FieldError> = nb.errors()
                        .map(|e| (&*e.field, e))
                        .collect();

                    Value::from_serializable(&errors)
                }
                "json" => Value::from_serializable(&nb.projection()),
                // Schema fields: undefined unless the field is valid.
                field => Value::from_serializable(nb.field(field)?.value()?),
            };

            Some(value)
        }

        fn fields(&self) -> Vec<Arc<str>> {
            let mut fields: Vec<Arc<str>> = NOTEBOOK_FIELDS.iter().map(|&f| f.into()).collect();
            fields.extend(self.notebook.schema().iter().map(|spec| spec.name().clone()));
            fields
        }
    }

    impl CatalogObject {
        fn list<'a, I>(&self, notebooks: I) -> Value
            where I: Iterator<Item = &'a Arc<Notebook>>
        {
            let values: Vec<Value> = notebooks
                .map(|nb| notebook(nb.clone(), self.root.clone()))
                .collect();

            Value::from(values)
        }
    }

    impl StructObject for CatalogObject {
        fn get_field(&self, name: &str) -> Option<Value> {
            let value = match name {
                "notebooks" => self.list(self.catalog.notebooks.iter()),
                "valid_notebooks" => self.list(self.catalog.valid()),
                "invalid_notebooks" => self.list(self.catalog.invalid()),
                "unreadable" => {
                    let entries: Vec<_> = self.catalog.unreadable.iter()
                        .map(|u| UnreadableEntry { filename: &u.filename, error: u.error.to_string() })
                        .collect();

                    Value::from_serializable(&entries)
                }
                _ => return None,
            };

            Some(value)
        }

        fn static_fields(&self) -> Option<&'static [&'static str]> {
            Some(CATALOG_FIELDS)
        }
    }

    impl StructObject for Page {
        fn get_field(&self, name: &str) -> Option<Value> {
            (name == "notebook").then(|| self.0.clone())
        }

        fn static_fields(&self) -> Option<&'static [&'static str]> {
            Some(&["notebook"])
        }
    }
}

impl_error_detail_with_std_error!(minijinja::Error);

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::fixtures;
    use crate::source::{Catalog, Unreadable};

    fn engine(templates: &[(&str, &str)]) -> (tempfile::TempDir, MiniJinjaEngine) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in templates {
            fs::write(dir.path().join(name), contents).unwrap();
        }

        let globals = toml::toml! { title = "Gallery" };
        let engine = MiniJinjaEngine::new(dir.path(), globals, "/nb").unwrap();
        (dir, engine)
    }

    #[test]
    fn notebook_page() {
        let (_dir, engine) = engine(&[(
            "notebook.html",
            "{{ site.title }}|{{ notebook.title }}|{{ notebook.url }}|{{ notebook.valid }}|\
             {{ notebook.keywords|join(',') }}|{{ notebook.description|markdown_inline }}"
        )]);

        let nb = Arc::new(fixtures::valid("Wave Equation.ipynb"));
        let html = engine.render("notebook.html", &Context::Notebook(nb)).unwrap();
        assert_eq!(html, "Gallery|Title|/nb/wave-equation.html|true|plots,physics,waves|\
            A <em>short</em> description\nover two lines.");
    }

    #[test]
    fn invalid_fields_are_undefined_and_reported() {
        let (_dir, engine) = engine(&[(
            "notebook.html",
            "{{ notebook.title is defined }}|{{ notebook.author }}|\
             {{ notebook.field_errors.title.suggestion }}|\
             {% for e in notebook.errors %}{{ e.field }}:{{ e.kind }};{% endfor %}|\
             {{ notebook.json|length }}"
        )]);

        let nb = Arc::new(fixtures::invalid("broken.ipynb"));
        let html = engine.render("notebook.html", &Context::Notebook(nb)).unwrap();
        assert_eq!(html, "false|Jane Doe|# Title|title:format;image:absence;|0");
    }

    #[test]
    fn catalog_pages() {
        let (_dir, engine) = engine(&[(
            "index.html",
            "{{ notebooks|length }}/{{ valid_notebooks|length }}/{{ invalid_notebooks|length }}\
             {% for u in unreadable %} {{ u.filename }}{% endfor %}"
        )]);

        let catalog = Catalog {
            notebooks: vec![Arc::new(fixtures::valid("a.ipynb")), Arc::new(fixtures::invalid("b.ipynb"))],
            unreadable: vec![Unreadable { filename: "c.ipynb".into(), error: error!("nope") }],
        };

        let html = engine.render("index.html", &Context::Catalog(Arc::new(catalog))).unwrap();
        assert_eq!(html, "2/1/1 c.ipynb");
    }

    #[test]
    fn helpers() {
        let (_dir, engine) = engine(&[(
            "index.html",
            "{{ icon('Git Hub') }}|{{ 'A b'|slugify }}|{{ 0|date('%Y-%m-%d') }}|\
             {{ '2024-03-01'|date('%d.%m') }}|{{ '*x*'|markdown }}|{{ now() > 0 }}"
        )]);

        let catalog = Arc::new(Catalog::default());
        let html = engine.render("index.html", &Context::Catalog(catalog)).unwrap();
        assert_eq!(html, "<svg class=\"icon icon-git-hub\" aria-hidden=\"true\">\
            <use href=\"/nb/static/icons.svg#git-hub\"></use></svg>|a-b|1970-01-01|\
            01.03|<p><em>x</em></p>\n|true");
    }

    #[test]
    fn missing_template_is_an_error() {
        let (_dir, engine) = engine(&[]);
        let catalog = Arc::new(Catalog::default());
        let error = engine.render("index.html", &Context::Catalog(catalog)).unwrap_err();
        assert!(error.to_string().contains("failed to load template"));
    }

    #[test]
    fn missing_template_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MiniJinjaEngine::new(dir.path().join("nope"), (), "/").is_err());
    }
}
