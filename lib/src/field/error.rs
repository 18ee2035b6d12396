use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ErrorDetail;

/// What went wrong while evaluating a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    /// The located value has the wrong structure: not text, not a sequence.
    Shape,
    /// The located value breaks a textual convention. Usually has a fix.
    Format,
    /// Nothing was located and the field is required.
    Absence,
}

/// A field failure before it is attributed to a field.
///
/// Shapes and steps produce these; [`FieldSpec`](crate::field::FieldSpec)
/// evaluation turns them into a [`FieldError`] naming the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub kind: FieldErrorKind,
    pub raw: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Arc<str>,
    pub kind: FieldErrorKind,
    pub raw: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Every field error of one notebook, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub notebook: Arc<str>,
    pub errors: Vec<FieldError>,
}

impl Invalid {
    pub fn shape<R: Into<String>, M: Into<String>>(raw: R, message: M) -> Self {
        Invalid {
            kind: FieldErrorKind::Shape,
            raw: Some(raw.into()),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn format<R: Into<String>, M: Into<String>>(raw: R, message: M) -> Self {
        Invalid {
            kind: FieldErrorKind::Format,
            raw: Some(raw.into()),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn absent<M: Into<String>>(message: M) -> Self {
        Invalid {
            kind: FieldErrorKind::Absence,
            raw: None,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn suggest<S: Into<String>>(mut self, suggestion: S) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn on(self, field: &Arc<str>) -> FieldError {
        FieldError {
            field: field.clone(),
            kind: self.kind,
            raw: self.raw,
            message: self.message,
            suggestion: self.suggestion,
        }
    }
}

impl FieldError {
    /// A multi-line, indented description including the offending text and
    /// the suggested replacement, if any.
    pub fn diagnostic(&self) -> String {
        let mut block = self.to_string();
        for (key, value) in self.context() {
            let key = key.unwrap_or_default();
            let value = value.replace('\n', "\n        ");
            block.push_str(&format!("\n    {key:>10}: {value}"));
        }

        block
    }
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldErrorKind::Shape => "shape".fmt(f),
            FieldErrorKind::Format => "format".fmt(f),
            FieldErrorKind::Absence => "absence".fmt(f),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ErrorDetail for FieldError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut context = vec![];
        if let Some(raw) = &self.raw {
            context.push((Some("found".into()), raw.trim_end().to_string()));
        }

        if let Some(suggestion) = &self.suggestion {
            context.push((Some("suggestion".into()), suggestion.clone()));
        }

        context
    }
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> impl Iterator<Item = &FieldError> {
        let field = field.to_string();
        self.errors.iter().filter(move |e| &*e.field == field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "notebook `{}` is invalid: 1 problem", self.notebook),
            n => write!(f, "notebook `{}` is invalid: {n} problems", self.notebook),
        }
    }
}

impl ErrorDetail for ValidationReport {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.errors.iter()
            .map(|e| (None, e.diagnostic()))
            .collect()
    }
}
