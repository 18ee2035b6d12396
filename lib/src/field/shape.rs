use std::sync::Arc;

use serde_json::Value;

use crate::field::{FieldValue, Image, Invalid};

/// How located JSON becomes a [`FieldValue`]: the first half of cleaning.
#[derive(Debug, Clone)]
pub enum Shape {
    /// A single string. A sequence of string fragments is joined.
    Text,
    /// A sequence of string fragments joined into one string. A lone string
    /// is accepted as a sequence of one.
    Multiline,
    /// The first output payload carrying a recognized image kind.
    Image(ImageKinds),
}

/// How an image kind is turned into markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// The payload is markup already (SVG) and is used as is.
    Markup,
    /// The payload is base64 and is embedded in an `<img>` data URL.
    Base64,
}

/// The recognized image kinds and how each is embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageKinds(Arc<[(Arc<str>, ImageEncoding)]>);

impl ImageKinds {
    pub fn new<I, S>(kinds: I) -> Self
        where I: IntoIterator<Item = (S, ImageEncoding)>, S: Into<Arc<str>>
    {
        ImageKinds(kinds.into_iter().map(|(mime, enc)| (mime.into(), enc)).collect())
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(mime, _)| &**mime)
    }

    fn encoding(&self, mime: &str) -> Option<ImageEncoding> {
        self.0.iter().find(|(known, _)| &**known == mime).map(|(_, enc)| *enc)
    }

    /// Selects the first payload in `payloads` that has a recognized kind.
    /// Within a payload, the first recognized key in the payload's own order
    /// wins.
    fn select(&self, payloads: &[Value]) -> Option<Image> {
        payloads.iter()
            .filter_map(|payload| payload.as_object())
            .find_map(|payload| payload.iter().find_map(|(mime, raw)| {
                let encoding = self.encoding(mime)?;
                let data = join_fragments(raw)?;
                let html = match encoding {
                    ImageEncoding::Markup => data.clone(),
                    ImageEncoding::Base64 => {
                        format!(r#"<img src="data:{mime};base64,{}">"#, data.trim())
                    }
                };

                Some(Image { mime_type: mime.to_string(), data, html })
            }))
    }
}

impl Default for ImageKinds {
    fn default() -> Self {
        ImageKinds::new([
            ("image/svg+xml", ImageEncoding::Markup),
            ("image/png", ImageEncoding::Base64),
        ])
    }
}

impl Shape {
    pub fn extract(&self, raw: &Value) -> Result<FieldValue, Invalid> {
        match self {
            Shape::Text => match raw {
                Value::String(s) => Ok(FieldValue::Text(s.clone())),
                other => join_fragments(other)
                    .map(FieldValue::Text)
                    .ok_or_else(|| Invalid::shape(compact(other), "expected text")),
            },
            Shape::Multiline => join_fragments(raw)
                .map(FieldValue::Text)
                .ok_or_else(|| Invalid::shape(compact(raw), "expected a sequence of lines")),
            Shape::Image(kinds) => {
                let payloads = raw.as_array()
                    .ok_or_else(|| Invalid::shape(compact(raw), "expected a sequence of outputs"))?;

                kinds.select(payloads)
                    .map(FieldValue::Image)
                    .ok_or_else(|| {
                        let kinds = kinds.mime_types().collect::<Vec<_>>().join(", ");
                        Invalid::absent(format!("no output has an image of kind {kinds}"))
                    })
            }
        }
    }
}

/// Joins a string or a sequence of strings. `None` for anything else.
fn join_fragments(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter()
            .map(|item| item.as_str())
            .collect::<Option<String>>(),
        _ => None,
    }
}

/// A short rendering of `value` for error reports.
fn compact(value: &Value) -> String {
    const MAX: usize = 80;

    let string = value.to_string();
    match string.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}…", &string[..i]),
        None => string,
    }
}
