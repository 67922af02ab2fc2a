//! Built-in Markdown markup backed by pulldown-cmark.

use super::Markup;
use pulldown_cmark::{html, Options, Parser};

/// Markdown markup: owns `content/md/` and the `.md` / `.markdown` suffixes
pub struct MarkdownMarkup {
    options: Options,
}

impl MarkdownMarkup {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }
}

impl Default for MarkdownMarkup {
    fn default() -> Self {
        Self::new()
    }
}

impl Markup for MarkdownMarkup {
    fn dir(&self) -> &str {
        "md"
    }

    fn extensions(&self) -> &[&str] {
        &[".md", ".markdown"]
    }

    fn convert(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);
        html_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_paragraph() {
        let html = MarkdownMarkup::new().convert("Hello *world*");
        assert_eq!(html, "<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn test_more_marker_passes_through() {
        let html = MarkdownMarkup::new().convert("Intro\n\n<!--more-->\n\nRest");
        assert!(html.contains("<!--more-->"));
        assert!(html.starts_with("<p>Intro</p>"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = MarkdownMarkup::new().convert("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_extensions() {
        let markup = MarkdownMarkup::new();
        assert_eq!(markup.dir(), "md");
        assert!(markup.matches("post.md"));
        assert!(markup.matches("post.markdown"));
        assert!(!markup.matches("post.adoc"));
    }
}
