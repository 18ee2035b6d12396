//! Declarative metadata fields.
//!
//! A [`FieldSpec`] says where a piece of metadata lives in a notebook and what
//! it must look like. Evaluating a spec against a raw document runs three
//! phases, each of which may fail with an [`Invalid`]:
//!
//!   1. **locate**: run the field's [`Query`]; finding nothing is handled by
//!      the field's [`Absent`] policy, not by the field guessing,
//!   2. **clean**: convert the located JSON with the field's [`Shape`], then
//!      run every [`Phase::Clean`] step,
//!   3. **validate**: run every [`Phase::Validate`] step.
//!
//! The first failure ends evaluation and is reported as a [`FieldError`]
//! naming the field.

mod error;
mod shape;
mod step;

pub use error::*;
pub use shape::*;
pub use step::*;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as Json;

use crate::query::{Query, QueryError};

pub type FieldResult = Result<FieldValue, FieldError>;

/// A successfully cleaned field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Image(Image),
}

/// A thumbnail selected from a notebook's outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub mime_type: String,
    #[serde(rename = "image_data")]
    pub data: String,
    pub html: String,
}

/// What to do when a field's query locates nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absent {
    /// Report an absence error.
    Required,
    /// Use this value. Steps are not run on it.
    Default(FieldValue),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: Arc<str>,
    query: Query,
    shape: Shape,
    steps: Vec<Step>,
    absent: Absent,
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::List(_) => "list",
            FieldValue::Image(_) => "image",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Image> {
        match self {
            FieldValue::Image(i) => Some(i),
            _ => None,
        }
    }

    /// The text, or a shape error on behalf of `step`.
    pub fn into_text(self, step: &str) -> Result<String, Invalid> {
        match self {
            FieldValue::Text(s) => Ok(s),
            other => Err(Invalid::shape(other.kind(), format!("{step}: expected text"))),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            FieldValue::Text(s) => Json::from(s.as_str()),
            FieldValue::List(v) => Json::from(v.clone()),
            FieldValue::Image(image) => serde_json::json!({
                "mime_type": image.mime_type,
                "image_data": image.data,
                "html": image.html,
            }),
        }
    }
}

impl FieldSpec {
    /// A required field named `name` located by `query`, with no steps.
    pub fn new<N: Into<Arc<str>>>(name: N, query: &str, shape: Shape) -> Result<Self, QueryError> {
        Ok(FieldSpec {
            name: name.into(),
            query: Query::parse(query)?,
            shape,
            steps: vec![],
            absent: Absent::Required,
        })
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn or_default(mut self, value: FieldValue) -> Self {
        self.absent = Absent::Default(value);
        self
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn absent(&self) -> &Absent {
        &self.absent
    }

    /// The steps in the order they run: clean steps, then validate steps.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        let phase = |p| move |s: &&Step| s.phase() == p;
        self.steps.iter().filter(phase(Phase::Clean))
            .chain(self.steps.iter().filter(phase(Phase::Validate)))
    }

    pub fn evaluate(&self, document: &Json) -> FieldResult {
        let located = match self.query.search(document) {
            Some(located) => located,
            None => return match &self.absent {
                Absent::Default(value) => Ok(value.clone()),
                Absent::Required => {
                    let message = format!("nothing found at `{}`", self.query);
                    Err(Invalid::absent(message).on(&self.name))
                }
            },
        };

        let value = self.shape.extract(&located).map_err(|e| e.on(&self.name))?;
        self.steps().try_fold(value, |value, step| step.apply(value))
            .map_err(|e| e.on(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn validate_steps_run_after_clean_steps() {
        let spec = FieldSpec::new("author", "author", Shape::Text).unwrap()
            .step(Step::author())
            .step(Step::header(2, true));

        let names: Vec<_> = spec.steps().map(|s| s.name()).collect();
        assert_eq!(names, ["header", "author"]);

        let doc = json!({ "author": "## Author: Jane Doe" });
        assert_eq!(spec.evaluate(&doc), Ok(FieldValue::Text("Jane Doe".into())));
    }

    #[test]
    fn absence_policy() {
        let doc = json!({ "cells": [] });
        let required = FieldSpec::new("title", "cells[0].source[0]", Shape::Text).unwrap();
        let error = required.evaluate(&doc).unwrap_err();
        assert_eq!(error.kind, FieldErrorKind::Absence);
        assert_eq!(&*error.field, "title");
        assert_eq!(error.raw, None);

        let optional = FieldSpec::new("keywords", "cells[4].source", Shape::Multiline).unwrap()
            .step(Step::list())
            .or_default(FieldValue::List(vec![]));

        assert_eq!(optional.evaluate(&doc), Ok(FieldValue::List(vec![])));
    }

    #[test]
    fn first_failure_ends_the_chain() {
        let spec = FieldSpec::new("author", "a", Shape::Text).unwrap()
            .step(Step::header(2, true))
            .step(Step::author());

        let error = spec.evaluate(&json!({ "a": "# Jane Doe" })).unwrap_err();
        assert_eq!(error.suggestion.as_deref(), Some("## Jane Doe"));

        let error = spec.evaluate(&json!({ "a": 7 })).unwrap_err();
        assert_eq!(error.kind, FieldErrorKind::Shape);
    }

    #[test]
    fn json_projection_of_values() {
        let list = FieldValue::List(vec!["a".into()]);
        assert_eq!(list.to_json(), json!(["a"]));
        assert_eq!(serde_json::to_value(&list).unwrap(), json!(["a"]));
    }
}
