//! Markdown cleanup for provider output.
//!
//! Responses are rendered to HTML with pulldown-cmark and the markup is then
//! stripped again. Paragraph-level blocks are separated by a blank line and
//! list items or table rows by a single newline, so plain text comes back
//! unchanged apart from trailing whitespace.

use pulldown_cmark::{html, Options, Parser};
use scraper::{ElementRef, Html, Node};
use std::error::Error as StdError;
use std::fmt;

/// Blocks separated from their neighbours by a blank line.
const PARAGRAPH_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "ul", "ol", "blockquote", "table", "hr",
    "div", "dl",
];

/// Blocks that only need to start on their own line.
const LINE_ELEMENTS: &[&str] = &["li", "thead", "tbody", "tr", "th", "td", "dt", "dd"];

#[derive(Debug)]
pub enum FormatError {
    /// The HTML writer reported a failure while rendering.
    Render(fmt::Error),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Render(source) => write!(f, "failed to render markdown: {source}"),
        }
    }
}

impl StdError for FormatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FormatError::Render(source) => Some(source),
        }
    }
}

/// Render `text` as Markdown and return its plain-text content.
///
/// Failures never propagate: the returned string carries the error message
/// instead, so callers can display or store it like any other response.
pub fn format_text(text: &str) -> String {
    match markdown_to_plain(text) {
        Ok(plain) => plain,
        Err(err) => format!("Error formatting text: {err}"),
    }
}

pub fn markdown_to_plain(text: &str) -> Result<String, FormatError> {
    let rendered = markdown_to_html(text)?;
    Ok(strip_markup(&rendered))
}

fn markdown_to_html(text: &str) -> Result<String, FormatError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut rendered = String::with_capacity(text.len() * 3 / 2);
    html::write_html_fmt(&mut rendered, parser).map_err(FormatError::Render)?;
    Ok(rendered)
}

fn strip_markup(rendered: &str) -> String {
    let fragment = Html::parse_fragment(rendered);
    let mut text = PlainText::default();
    text.collect(fragment.root_element());
    let mut out = text.out;
    out.truncate(out.trim_end().len());
    out
}

/// Newlines a block element asks for around itself, if it is a block.
fn block_break(name: &str) -> Option<usize> {
    if PARAGRAPH_ELEMENTS.contains(&name) {
        Some(2)
    } else if LINE_ELEMENTS.contains(&name) {
        Some(1)
    } else {
        None
    }
}

#[derive(Default)]
struct PlainText {
    out: String,
    /// Newlines owed before the next piece of text.
    pending: usize,
}

impl PlainText {
    fn request_break(&mut self, newlines: usize) {
        self.pending = self.pending.max(newlines);
    }

    fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.out.is_empty() {
            self.pending = 0;
            self.out.push_str(text.trim_start_matches('\n'));
            return;
        }
        let already = self.out.len() - self.out.trim_end_matches('\n').len();
        for _ in already..self.pending {
            self.out.push('\n');
        }
        self.pending = 0;
        self.out.push_str(text);
    }

    fn collect(&mut self, element: ElementRef<'_>) {
        // Whitespace between block children is layout from the HTML writer.
        let holds_blocks = element.children().any(|child| {
            child
                .value()
                .as_element()
                .is_some_and(|el| block_break(el.name()).is_some())
        });

        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    if holds_blocks && text.trim().is_empty() {
                        continue;
                    }
                    self.push(text);
                }
                Node::Element(child_element) => {
                    let Some(child_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let name = child_element.name();
                    if name == "br" {
                        self.push("\n");
                        continue;
                    }

                    let newlines = block_break(name);
                    if let Some(n) = newlines {
                        self.request_break(n);
                    }
                    self.collect(child_ref);
                    if let Some(n) = newlines {
                        self.request_break(n);
                    }
                }
                _ => {}
            }
        }
    }
}
