//! HTML renderer collaborator.
//!
//! Collects the operation stream into layout blocks and renders them through
//! an embedded `tera` template in `finish`. Consecutive bullets, numbered
//! items and contents entries are merged into one list each. Print layout
//! (page breaks, contents page numbers) is left to CSS paged media.

use std::collections::HashMap;

use propkit_core::{ParagraphStyle, RenderError, Renderer, Span};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

const TEMPLATE_NAME: &str = "document.html";
const MAX_HEADING_LEVEL: u8 = 4;
const HEADING_TAGS: [&str; 5] = ["h1", "h2", "h3", "h4", "h5"];

/// Lower-case alphanumerics joined by single dashes.
pub fn anchor(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Debug, Serialize)]
struct InlineSpan {
    text: String,
    emphasis: bool,
}

fn inline(spans: &[Span]) -> Vec<InlineSpan> {
    spans.iter().map(|span| InlineSpan { text: span.text.clone(), emphasis: span.emphasis }).collect()
}

#[derive(Debug, Serialize)]
struct TocLine {
    depth: u8,
    anchor: String,
    label: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Block {
    Heading { level: u8, tag: &'static str, id: String, text: String },
    Paragraph { style: ParagraphStyle, spans: Vec<InlineSpan> },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    List { tag: &'static str, items: Vec<Vec<InlineSpan>> },
    Toc { entries: Vec<TocLine> },
    PageBreak,
}

pub struct HtmlRenderer {
    tera: Tera,
    footer: String,
    title: Option<String>,
    blocks: Vec<Block>,
    anchors: HashMap<String, usize>,
}

impl HtmlRenderer {
    /// `footer` is printed at the end of the document; empty means none.
    pub fn new(footer: impl Into<String>) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, include_str!("../templates/document.html.tera"))
            .map_err(|error| RenderError::Output(format!("document template is invalid: {error}")))?;

        Ok(Self {
            tera,
            footer: footer.into(),
            title: None,
            blocks: Vec::new(),
            anchors: HashMap::new(),
        })
    }

    /// First heading with a given anchor keeps it, so contents links land
    /// there; repeats get `-2`, `-3`, ...
    fn unique_anchor(&mut self, text: &str) -> String {
        let base = anchor(text);
        let seen = self.anchors.entry(base.clone()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            base
        } else {
            format!("{base}-{seen}")
        }
    }

    fn push_list_item(&mut self, tag: &'static str, spans: &[Span]) {
        if let Some(Block::List { tag: open, items }) = self.blocks.last_mut() {
            if *open == tag {
                items.push(inline(spans));
                return;
            }
        }
        self.blocks.push(Block::List { tag, items: vec![inline(spans)] });
    }
}

impl Renderer for HtmlRenderer {
    type Output = String;

    fn add_heading(&mut self, level: u8, text: &str) -> Result<(), RenderError> {
        let tag = HEADING_TAGS
            .get(usize::from(level))
            .copied()
            .filter(|_| level <= MAX_HEADING_LEVEL)
            .ok_or_else(|| RenderError::Rejected(format!("heading level {level} is not supported")))?;
        if level == 0 && self.title.is_none() {
            self.title = Some(text.to_string());
        }
        let id = self.unique_anchor(text);
        self.blocks.push(Block::Heading { level, tag, id, text: text.to_string() });
        Ok(())
    }

    fn add_paragraph(&mut self, spans: &[Span], style: ParagraphStyle) -> Result<(), RenderError> {
        self.blocks.push(Block::Paragraph { style, spans: inline(spans) });
        Ok(())
    }

    fn add_table(&mut self, headers: &[String], rows: &[Vec<String>]) -> Result<(), RenderError> {
        if !headers.is_empty() {
            if let Some(row) = rows.iter().find(|row| row.len() != headers.len()) {
                return Err(RenderError::Rejected(format!(
                    "table row has {} cells but {} headers",
                    row.len(),
                    headers.len()
                )));
            }
        }
        self.blocks.push(Block::Table { headers: headers.to_vec(), rows: rows.to_vec() });
        Ok(())
    }

    fn add_bullet(&mut self, spans: &[Span]) -> Result<(), RenderError> {
        self.push_list_item("ul", spans);
        Ok(())
    }

    fn add_numbered(&mut self, spans: &[Span]) -> Result<(), RenderError> {
        self.push_list_item("ol", spans);
        Ok(())
    }

    fn add_toc_entry(&mut self, depth: u8, number: &str, title: &str) -> Result<(), RenderError> {
        // Group entries point at "<n>. <group>" headings, subsections at their title.
        let (label, target) = if depth <= 1 {
            let label = format!("{number}. {title}");
            (label.clone(), label)
        } else {
            (format!("{number} {title}"), title.to_string())
        };
        let line = TocLine { depth, anchor: anchor(&target), label };

        if let Some(Block::Toc { entries }) = self.blocks.last_mut() {
            entries.push(line);
        } else {
            self.blocks.push(Block::Toc { entries: vec![line] });
        }
        Ok(())
    }

    fn add_page_break(&mut self) -> Result<(), RenderError> {
        self.blocks.push(Block::PageBreak);
        Ok(())
    }

    fn finish(self) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("title", self.title.as_deref().unwrap_or("Proposal"));
        context.insert("footer", &self.footer);
        context.insert("blocks", &self.blocks);

        let html = self
            .tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| RenderError::Output(format!("template rendering failed: {error}")))?;
        debug!(blocks = self.blocks.len(), bytes = html.len(), "rendered html document");
        Ok(html)
    }
}
