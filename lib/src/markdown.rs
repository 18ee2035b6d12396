//! Markdown to HTML for notebook metadata.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

fn options() -> Options {
    Options::all().difference(Options::ENABLE_SMART_PUNCTUATION)
}

/// Renders `input` as block HTML.
///
/// ```rust
/// use nbsite::markdown;
///
/// assert_eq!(markdown::to_html("Some *text*."), "<p>Some <em>text</em>.</p>\n");
/// ```
pub fn to_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len() * 3 / 2);
    html::push_html(&mut output, Parser::new_ext(input, options()));
    output
}

/// Renders `input` as inline HTML: paragraphs are not wrapped in `<p>`, and
/// consecutive paragraphs are separated by a space.
///
/// ```rust
/// use nbsite::markdown;
///
/// assert_eq!(markdown::to_inline_html("A `title`"), "A <code>title</code>");
/// ```
pub fn to_inline_html(input: &str) -> String {
    let mut first = true;
    let events = Parser::new_ext(input, options()).filter_map(|event| match event {
        Event::Start(Tag::Paragraph) if first => {
            first = false;
            None
        }
        Event::Start(Tag::Paragraph) => Some(Event::Text(" ".into())),
        Event::End(TagEnd::Paragraph) => None,
        event => Some(event),
    });

    let mut output = String::with_capacity(input.len());
    html::push_html(&mut output, events);
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_markdown() {
        let html = to_html("# Heading\n\n- one\n- two\n");
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn inline_markdown_has_no_paragraphs() {
        assert_eq!(to_inline_html("one\n\ntwo **three**"), "one two <strong>three</strong>");
        assert_eq!(to_inline_html(""), "");
    }

    #[test]
    fn no_smart_punctuation() {
        assert_eq!(to_inline_html("\"quoted\" -- text"), "&quot;quoted&quot; -- text");
    }
}
