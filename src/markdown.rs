//! Small markdown to HTML converter for article bodies.
//!
//! Covers what the editor produces: ATX headings, paragraphs, blockquotes,
//! flat lists, fenced code, horizontal rules, and inline code, bold,
//! italic and links. All text is HTML-escaped before inline rules run.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{ArticleContent, BlockKind, ContentBlock};

enum Block {
    Paragraph(Vec<String>),
    Quote(Vec<String>),
    Unordered(Vec<String>),
    Ordered(Vec<String>),
}

pub struct MarkdownRenderer {
    heading: Regex,
    ordered_item: Regex,
    code_span: Regex,
    bold: Regex,
    italic: Regex,
    link: Regex,
}

impl MarkdownRenderer {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AppError::Config(format!("bad markdown pattern: {e}")))
        };
        Ok(Self {
            heading: compile(r"^(#{1,6})\s+(.*?)\s*#*\s*$")?,
            ordered_item: compile(r"^\d+[.)]\s+(.*)$")?,
            code_span: compile(r"`([^`]+)`")?,
            bold: compile(r"\*\*(.+?)\*\*|__(.+?)__")?,
            italic: compile(r"\*([^*]+)\*|\b_([^_]+)_\b")?,
            link: compile(r"\[([^\]]+)\]\(([^)\s]+)\)")?,
        })
    }

    pub fn render(&self, content: &ArticleContent) -> String {
        match content {
            ArticleContent::Markdown(text) => self.to_html(text),
            ArticleContent::Blocks(blocks) => self.blocks_to_html(blocks),
        }
    }

    pub fn to_html(&self, markdown: &str) -> String {
        let mut out = String::new();
        let mut current: Option<Block> = None;
        let mut code: Option<Vec<String>> = None;

        for line in markdown.lines() {
            if let Some(lines) = code.as_mut() {
                if line.trim_start().starts_with("```") {
                    out.push_str("<pre><code>");
                    out.push_str(&escape_html(&lines.join("\n")));
                    out.push_str("</code></pre>\n");
                    code = None;
                } else {
                    lines.push(line.to_string());
                }
                continue;
            }

            let trimmed = line.trim();

            if trimmed.starts_with("```") {
                self.flush(&mut out, current.take());
                code = Some(Vec::new());
                continue;
            }

            if trimmed.is_empty() {
                self.flush(&mut out, current.take());
                continue;
            }

            if trimmed == "---" || trimmed == "***" {
                self.flush(&mut out, current.take());
                out.push_str("<hr>\n");
                continue;
            }

            if let Some(caps) = self.heading.captures(trimmed) {
                self.flush(&mut out, current.take());
                let level = caps[1].len();
                out.push_str(&format!(
                    "<h{level}>{}</h{level}>\n",
                    self.inline(&caps[2])
                ));
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('>') {
                let text = rest.trim_start().to_string();
                match current.as_mut() {
                    Some(Block::Quote(lines)) => lines.push(text),
                    _ => {
                        self.flush(&mut out, current.take());
                        current = Some(Block::Quote(vec![text]));
                    }
                }
                continue;
            }

            if let Some(item) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .or_else(|| trimmed.strip_prefix("+ "))
            {
                let item = item.trim().to_string();
                match current.as_mut() {
                    Some(Block::Unordered(items)) => items.push(item),
                    _ => {
                        self.flush(&mut out, current.take());
                        current = Some(Block::Unordered(vec![item]));
                    }
                }
                continue;
            }

            if let Some(caps) = self.ordered_item.captures(trimmed) {
                let item = caps[1].trim().to_string();
                match current.as_mut() {
                    Some(Block::Ordered(items)) => items.push(item),
                    _ => {
                        self.flush(&mut out, current.take());
                        current = Some(Block::Ordered(vec![item]));
                    }
                }
                continue;
            }

            match current.as_mut() {
                Some(Block::Paragraph(lines)) => lines.push(trimmed.to_string()),
                _ => {
                    self.flush(&mut out, current.take());
                    current = Some(Block::Paragraph(vec![trimmed.to_string()]));
                }
            }
        }

        // An unterminated fence still renders what it holds.
        if let Some(lines) = code {
            out.push_str("<pre><code>");
            out.push_str(&escape_html(&lines.join("\n")));
            out.push_str("</code></pre>\n");
        }
        self.flush(&mut out, current.take());

        out
    }

    /// Legacy block content: paragraphs, headings and attributed quotes.
    pub fn blocks_to_html(&self, blocks: &[ContentBlock]) -> String {
        let mut out = String::new();
        for block in blocks {
            match block.kind {
                BlockKind::Paragraph => {
                    out.push_str(&format!("<p>{}</p>\n", self.inline(&block.text)));
                }
                BlockKind::Heading => {
                    out.push_str(&format!("<h2>{}</h2>\n", self.inline(&block.text)));
                }
                BlockKind::Quote => {
                    out.push_str("<blockquote><p>");
                    out.push_str(&self.inline(&block.text));
                    out.push_str("</p>");
                    if let Some(author) = block.author.as_deref().filter(|a| !a.is_empty()) {
                        out.push_str(&format!("<cite>{}</cite>", escape_html(author)));
                    }
                    out.push_str("</blockquote>\n");
                }
            }
        }
        out
    }

    fn flush(&self, out: &mut String, block: Option<Block>) {
        let Some(block) = block else {
            return;
        };
        match block {
            Block::Paragraph(lines) => {
                out.push_str(&format!("<p>{}</p>\n", self.inline(&lines.join(" "))));
            }
            Block::Quote(lines) => {
                let body = self.to_html(&lines.join("\n"));
                out.push_str(&format!("<blockquote>\n{body}</blockquote>\n"));
            }
            Block::Unordered(items) => self.list(out, "ul", &items),
            Block::Ordered(items) => self.list(out, "ol", &items),
        }
    }

    fn list(&self, out: &mut String, tag: &str, items: &[String]) {
        out.push_str(&format!("<{tag}>\n"));
        for item in items {
            out.push_str(&format!("<li>{}</li>\n", self.inline(item)));
        }
        out.push_str(&format!("</{tag}>\n"));
    }

    /// Inline rules, applied outside code spans only.
    fn inline(&self, text: &str) -> String {
        let mut out = String::new();
        let mut last = 0;
        for caps in self.code_span.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&self.links(&text[last..whole.start()]));
            out.push_str(&format!("<code>{}</code>", escape_html(&caps[1])));
            last = whole.end();
        }
        out.push_str(&self.links(&text[last..]));
        out
    }

    /// Links become anchors; emphasis applies to the label and the text
    /// around it but never to the href.
    fn links(&self, text: &str) -> String {
        let mut out = String::new();
        let mut last = 0;
        for caps in self.link.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&self.emphasis(&text[last..whole.start()]));
            let label = self.emphasis(&caps[1]);
            let href = &caps[2];
            if is_safe_href(href) {
                out.push_str(&format!("<a href=\"{}\">{label}</a>", escape_html(href)));
            } else {
                out.push_str(&label);
            }
            last = whole.end();
        }
        out.push_str(&self.emphasis(&text[last..]));
        out
    }

    fn emphasis(&self, text: &str) -> String {
        let escaped = escape_html(text);
        let bold = self
            .bold
            .replace_all(&escaped, "<strong>${1}${2}</strong>")
            .into_owned();
        self.italic
            .replace_all(&bold, "<em>${1}${2}</em>")
            .into_owned()
    }
}

/// http(s) URLs and relative references only.
fn is_safe_href(href: &str) -> bool {
    let scheme_end = href.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if href[i..].starts_with(':') => {
            let scheme = href[..i].to_ascii_lowercase();
            scheme == "http" || scheme == "https"
        }
        _ => true,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
