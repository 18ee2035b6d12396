use std::path::Path;
use std::sync::Arc;

use derive_more::Debug;
use once_cell::sync::OnceCell;
use serde_json::Value as Json;

use crate::error::{Chainable, Result};
use crate::field::{FieldError, FieldResult, FieldSpec, FieldValue, Image, ValidationReport};
use crate::schema::{self, Schema};
use crate::util::slugify;

/// One notebook document bound to a schema.
///
/// The raw document is never modified. Fields are evaluated lazily, at most
/// once each, and independently of one another.
#[derive(Debug)]
pub struct Notebook {
    pub filename: Arc<str>,
    pub slug: Arc<str>,
    #[debug(ignore)]
    raw: Json,
    #[debug(ignore)]
    schema: Arc<Schema>,
    results: Vec<OnceCell<FieldResult>>,
}

/// A [`FieldSpec`] attached to one [`Notebook`].
#[derive(Debug, Clone, Copy)]
pub struct BoundField<'n> {
    spec: &'n FieldSpec,
    raw: &'n Json,
    result: &'n OnceCell<FieldResult>,
}

impl<'n> BoundField<'n> {
    pub fn name(&self) -> &'n str {
        self.spec.name()
    }

    pub fn spec(&self) -> &'n FieldSpec {
        self.spec
    }

    pub fn evaluate(&self) -> &'n FieldResult {
        let (spec, raw) = (self.spec, self.raw);
        self.result.get_or_init(|| spec.evaluate(raw))
    }

    pub fn value(&self) -> Option<&'n FieldValue> {
        self.evaluate().as_ref().ok()
    }

    pub fn error(&self) -> Option<&'n FieldError> {
        self.evaluate().as_ref().err()
    }
}

impl Notebook {
    /// Binds every field of `schema` to `raw`. Nothing is evaluated yet.
    pub fn new<F: Into<Arc<str>>>(filename: F, raw: Json, schema: Arc<Schema>) -> Self {
        let filename = filename.into();
        let stem = filename.rsplit_once('.').map_or(&*filename, |(stem, _)| stem);
        let slug = match slugify(stem) {
            slug if slug.is_empty() => "notebook".into(),
            slug => slug.into(),
        };

        let results = (0..schema.len()).map(|_| OnceCell::new()).collect();
        Notebook { filename, slug, raw, schema, results }
    }

    pub fn from_slice<F>(filename: F, bytes: &[u8], schema: Arc<Schema>) -> Result<Self>
        where F: Into<Arc<str>>
    {
        let filename = filename.into();
        let raw = serde_json::from_slice(bytes).chain_with(|| error! {
            "notebook is not valid JSON",
            "notebook" => &filename,
        })?;

        Ok(Notebook::new(filename, raw, schema))
    }

    pub fn open<P: AsRef<Path>>(path: P, schema: Arc<Schema>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path.file_name()
            .map(|name| name.to_string_lossy())
            .ok_or_else(|| error!("notebook path has no file name", "path" => path.display()))?;

        let bytes = std::fs::read(path).chain_with(|| error! {
            "failed to read notebook",
            "path" => path.display(),
        })?;

        Notebook::from_slice(&*filename, &bytes, schema)
    }

    pub fn raw(&self) -> &Json {
        &self.raw
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn field(&self, name: &str) -> Option<BoundField<'_>> {
        let i = self.schema.position(name)?;
        Some(self.bind(self.schema.at(i)?, self.results.get(i)?))
    }

    /// Every bound field, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = BoundField<'_>> {
        self.schema.iter()
            .zip(&self.results)
            .map(|(spec, result)| self.bind(spec, result))
    }

    fn bind<'n>(&'n self, spec: &'n FieldSpec, result: &'n OnceCell<FieldResult>) -> BoundField<'n> {
        BoundField { spec, raw: &self.raw, result }
    }

    /// Evaluates every field and collects every failure.
    pub fn validate(&self) -> Result<(), ValidationReport> {
        let errors: Vec<FieldError> = self.errors().cloned().collect();
        if errors.is_empty() {
            return Ok(());
        }

        Err(ValidationReport { notebook: self.filename.clone(), errors })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Every field error, in schema order.
    pub fn errors(&self) -> impl Iterator<Item = &FieldError> {
        self.fields().filter_map(|field| field.error())
    }

    /// The fields as a JSON object, plus `filename` and `slug`.
    ///
    /// Empty when any field is invalid: consumers of the projection never see
    /// partial metadata.
    pub fn projection(&self) -> Json {
        let mut map = serde_json::Map::new();
        for field in self.fields() {
            match field.evaluate() {
                Ok(value) => map.insert(field.name().into(), value.to_json()),
                Err(_) => return Json::Object(Default::default()),
            };
        }

        map.insert("filename".into(), Json::from(&*self.filename));
        map.insert("slug".into(), Json::from(&*self.slug));
        Json::Object(map)
    }

    fn get<'a, T: ?Sized>(
        &'a self,
        name: &str,
        f: impl FnOnce(&'a FieldValue) -> Option<&'a T>,
    ) -> Option<Result<&'a T, &'a FieldError>> {
        match self.field(name)?.evaluate() {
            Ok(value) => f(value).map(Ok),
            Err(e) => Some(Err(e)),
        }
    }

    pub fn title(&self) -> Option<Result<&str, &FieldError>> {
        self.get(schema::TITLE, FieldValue::as_text)
    }

    pub fn author(&self) -> Option<Result<&str, &FieldError>> {
        self.get(schema::AUTHOR, FieldValue::as_text)
    }

    pub fn description(&self) -> Option<Result<&str, &FieldError>> {
        self.get(schema::DESCRIPTION, FieldValue::as_text)
    }

    pub fn references(&self) -> Option<Result<&[String], &FieldError>> {
        self.get(schema::REFERENCES, FieldValue::as_list)
    }

    pub fn keywords(&self) -> Option<Result<&[String], &FieldError>> {
        self.get(schema::KEYWORDS, FieldValue::as_list)
    }

    pub fn requirements(&self) -> Option<Result<&[String], &FieldError>> {
        self.get(schema::REQUIREMENTS, FieldValue::as_list)
    }

    pub fn image(&self) -> Option<Result<&Image, &FieldError>> {
        self.get(schema::IMAGE, FieldValue::as_image)
    }
}
