use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::field::{FieldSpec, FieldValue, ImageKinds, Shape, Step};

pub const TITLE: &str = "title";
pub const AUTHOR: &str = "author";
pub const DESCRIPTION: &str = "description";
pub const REFERENCES: &str = "references";
pub const KEYWORDS: &str = "keywords";
pub const REQUIREMENTS: &str = "requirements";
pub const IMAGE: &str = "image";

/// An ordered set of uniquely named field specs.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    index: FxHashMap<Arc<str>, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    /// Appends `spec`. Fails if a field with the same name already exists.
    pub fn field(mut self, spec: FieldSpec) -> Result<Self> {
        if self.index.contains_key(spec.name()) {
            return err!("duplicate field in schema", "field" => spec.name());
        }

        self.index.insert(spec.name().clone(), self.fields.len());
        self.fields.push(spec);
        Ok(self)
    }

    /// The schema of a published notebook.
    ///
    /// The first six cells hold, in order: the title (`# Title`), the author
    /// (`## Author: Name`), a free-form description, then `###`-headed bullet
    /// lists of references, keywords and requirements. The thumbnail is the
    /// first image output anywhere in the notebook.
    pub fn notebook(images: ImageKinds) -> Result<Self> {
        let list = |name: &str, query: &str| -> Result<FieldSpec> {
            Ok(FieldSpec::new(name, query, Shape::Multiline)?
                .step(Step::header(3, false))
                .step(Step::list())
                .or_default(FieldValue::List(vec![])))
        };

        Schema::new()
            .field(FieldSpec::new(TITLE, "cells[0].source[0]", Shape::Text)?
                .step(Step::header(1, true)))?
            .field(FieldSpec::new(AUTHOR, "cells[1].source[0]", Shape::Text)?
                .step(Step::header(2, true))
                .step(Step::author()))?
            .field(FieldSpec::new(DESCRIPTION, "cells[2].source", Shape::Multiline)?)?
            .field(list(REFERENCES, "cells[3].source")?)?
            .field(list(KEYWORDS, "cells[4].source")?.step(Step::comma_separated()))?
            .field(list(REQUIREMENTS, "cells[5].source")?)?
            .field(FieldSpec::new(IMAGE, "cells[].outputs[].data", Shape::Image(images))?)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.at(self.position(name)?)
    }

    pub fn at(&self, i: usize) -> Option<&FieldSpec> {
        self.fields.get(i)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
