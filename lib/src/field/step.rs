use std::fmt;
use std::sync::Arc;

use crate::field::{FieldValue, Invalid};

type StepFn = dyn Fn(FieldValue) -> Result<FieldValue, Invalid> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Clean,
    Validate,
}

/// One named transformation in a field's chain.
///
/// All clean steps of a field run before any of its validate steps; within a
/// phase, steps run in the order they were added.
#[derive(Clone)]
pub struct Step {
    name: &'static str,
    phase: Phase,
    run: Arc<StepFn>,
}

impl Step {
    pub fn clean<F>(name: &'static str, f: F) -> Step
        where F: Fn(FieldValue) -> Result<FieldValue, Invalid> + Send + Sync + 'static
    {
        Step { name, phase: Phase::Clean, run: Arc::new(f) }
    }

    pub fn validate<F>(name: &'static str, f: F) -> Step
        where F: Fn(FieldValue) -> Result<FieldValue, Invalid> + Send + Sync + 'static
    {
        Step { name, phase: Phase::Validate, run: Arc::new(f) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn apply(&self, value: FieldValue) -> Result<FieldValue, Invalid> {
        (self.run)(value)
    }

    /// Requires the text to open with a heading of exactly `level` `#`s.
    ///
    /// Yields the heading text itself if `return_header`, and the text after
    /// the heading line otherwise.
    pub fn header(level: usize, return_header: bool) -> Step {
        Step::clean("header", move |value| {
            let text = value.into_text("header")?;
            let (heading, body) = split_heading(&text, level)?;
            if !return_header {
                return Ok(FieldValue::Text(body.trim().to_string()));
            }

            if heading.is_empty() {
                let marker = "#".repeat(level);
                return Err(Invalid::format(&*text, "heading text is empty")
                    .suggest(format!("{marker} <text>")));
            }

            Ok(FieldValue::Text(heading.to_string()))
        })
    }

    /// Collects every `-` or `*` bullet line into a list, in order.
    pub fn list() -> Step {
        Step::clean("list", |value| {
            let text = value.into_text("list")?;
            let items = text.lines()
                .filter_map(bullet_item)
                .map(String::from)
                .collect();

            Ok(FieldValue::List(items))
        })
    }

    /// Splits every list item on `,`, dropping empty pieces.
    pub fn comma_separated() -> Step {
        Step::clean("comma separated", |value| match value {
            FieldValue::List(items) => Ok(FieldValue::List(items.iter()
                .flat_map(|item| item.split(','))
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(String::from)
                .collect())),
            FieldValue::Text(text) => Ok(FieldValue::List(text.split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(String::from)
                .collect())),
            other => Err(Invalid::shape(other.kind(), "expected text or a list")),
        })
    }

    /// Requires the text to read `Author: <name>` and yields `<name>`.
    pub fn author() -> Step {
        Step::validate("author", |value| {
            let text = value.into_text("author")?;
            match text.trim().strip_prefix("Author:") {
                Some(rest) if rest.trim().is_empty() => {
                    Err(Invalid::format(&*text, "author name is empty")
                        .suggest("Author: <name>"))
                }
                Some(rest) if rest.starts_with(char::is_whitespace) => {
                    Ok(FieldValue::Text(rest.trim().to_string()))
                }
                Some(rest) => Err(Invalid::format(&*text, "expected a space after `Author:`")
                    .suggest(format!("Author: {}", rest.trim()))),
                None => Err(Invalid::format(&*text, "expected `Author: <name>`")
                    .suggest(format!("Author: {}", text.trim()))),
            }
        })
    }
}

/// Splits `text` into its heading line's text and the rest, checking that the
/// heading is at `level`.
fn split_heading(text: &str, level: usize) -> Result<(&str, &str), Invalid> {
    let marker = "#".repeat(level);
    let (line, body) = text.split_once('\n').unwrap_or((text, ""));
    let line = line.trim_end();

    let found = line.bytes().take_while(|&b| b == b'#').count();
    let rest = &line[found..];
    let content = rest.trim();
    let suggestion = || match content.is_empty() {
        true => format!("{marker} <text>"),
        false => format!("{marker} {content}"),
    };

    if found == 0 {
        return Err(Invalid::format(line, format!("expected a level-{level} heading (`{marker} `)"))
            .suggest(suggestion()));
    }

    if found != level {
        let message = format!("expected a level-{level} heading, found level {found}");
        return Err(Invalid::format(line, message).suggest(suggestion()));
    }

    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(Invalid::format(line, format!("expected a space after `{marker}`"))
            .suggest(suggestion()));
    }

    Ok((content, body))
}

/// The text of a bullet line without its marker, or `None`.
fn bullet_item(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let rest = line.strip_prefix('-').or_else(|| line.strip_prefix('*'))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    Some(rest.trim()).filter(|item| !item.is_empty())
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldErrorKind;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.into())
    }

    #[test]
    fn header_returns_heading_text() {
        let step = Step::header(1, true);
        assert_eq!(step.apply(text("# Title\n")), Ok(text("Title")));
        assert_eq!(step.apply(text("#   Spaced Out  ")), Ok(text("Spaced Out")));
    }

    #[test]
    fn header_suggests_correct_level() {
        let error = Step::header(1, true).apply(text("## Title\n")).unwrap_err();
        assert_eq!(error.kind, FieldErrorKind::Format);
        assert_eq!(error.suggestion.as_deref(), Some("# Title"));
        assert_eq!(error.raw.as_deref(), Some("## Title"));

        let error = Step::header(2, true).apply(text("Author: Jane")).unwrap_err();
        assert_eq!(error.suggestion.as_deref(), Some("## Author: Jane"));

        let error = Step::header(1, true).apply(text("#Title")).unwrap_err();
        assert_eq!(error.suggestion.as_deref(), Some("# Title"));
    }

    #[test]
    fn header_rejects_empty_heading() {
        let error = Step::header(1, true).apply(text("#  \n")).unwrap_err();
        assert_eq!(error.message, "heading text is empty");
    }

    #[test]
    fn header_body_and_list() {
        let source = text("### References\n- A\n* B\n\nnot an item\n-C\n  - D  \n");
        let body = Step::header(3, false).apply(source).unwrap();
        assert_eq!(body, text("- A\n* B\n\nnot an item\n-C\n  - D"));

        let list = Step::list().apply(body).unwrap();
        assert_eq!(list, FieldValue::List(vec!["A".into(), "B".into(), "D".into()]));
    }

    #[test]
    fn commas_split_items() {
        let list = FieldValue::List(vec!["a, b".into(), "c,,".into()]);
        let split = Step::comma_separated().apply(list).unwrap();
        assert_eq!(split, FieldValue::List(vec!["a".into(), "b".into(), "c".into()]));
    }

    #[test]
    fn author_line() {
        assert_eq!(Step::author().apply(text("Author: Jane Doe")), Ok(text("Jane Doe")));

        let error = Step::author().apply(text("Jane Doe")).unwrap_err();
        assert_eq!(error.kind, FieldErrorKind::Format);
        assert_eq!(error.suggestion.as_deref(), Some("Author: Jane Doe"));

        let error = Step::author().apply(text("Author:  ")).unwrap_err();
        assert_eq!(error.suggestion.as_deref(), Some("Author: <name>"));

        let error = Step::author().apply(text("Author:Jane")).unwrap_err();
        assert_eq!(error.kind, FieldErrorKind::Format);
        assert_eq!(error.suggestion.as_deref(), Some("Author: Jane"));
        assert_eq!(Step::author().apply(text("Author:\tJane")), Ok(text("Jane")));
    }

    #[test]
    fn steps_reject_wrong_value_kinds() {
        let list = FieldValue::List(vec![]);
        let error = Step::header(1, true).apply(list).unwrap_err();
        assert_eq!(error.kind, FieldErrorKind::Shape);
    }
}
