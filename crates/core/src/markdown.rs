//! Markdown-lite block classification.
//!
//! Section text is split into blank-line separated blocks. Each block is
//! offered to an ordered list of rules; the first rule that claims it decides
//! how it renders, and a block no rule claims becomes one joined paragraph.

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::domain::plan::{PlanWriter, Span};

/// A block that looked like a structured form but did not fit it. Always
/// recovered by trying the next rule.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MalformedBlockError {
    #[error("table header `{header}` is not followed by a separator row")]
    TableWithoutSeparator { header: String },
    #[error("{marked} of {total} lines carry a list marker")]
    PartialList { marked: usize, total: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockRule {
    Table,
    BulletList,
    NumberedList,
    Headed,
}

impl BlockRule {
    pub const CHAIN: [BlockRule; 4] =
        [BlockRule::Table, BlockRule::BulletList, BlockRule::NumberedList, BlockRule::Headed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::BulletList => "bullet_list",
            Self::NumberedList => "numbered_list",
            Self::Headed => "headed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeadedLine {
    Heading { level: u8, text: String },
    Paragraph(Vec<Span>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Bullets(Vec<Vec<Span>>),
    Numbered(Vec<Vec<Span>>),
    Headed(Vec<HeadedLine>),
    Paragraph(Vec<Span>),
}

#[derive(Debug)]
pub struct BlockClassifier {
    block_break: Regex,
    numbered: Regex,
    numbered_prefix: Regex,
    bullet_prefix: Regex,
    heading: Regex,
    emphasis: Regex,
}

impl BlockClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            block_break: Regex::new(r"\n\s*\n")?,
            numbered: Regex::new(r"^\s*\d+\.")?,
            numbered_prefix: Regex::new(r"^\s*\d+\.\s*")?,
            bullet_prefix: Regex::new(r"^[-*•]\s*")?,
            heading: Regex::new(r"^(#{1,6})\s+(.+)$")?,
            emphasis: Regex::new(r"\*\*.*?\*\*")?,
        })
    }

    /// Non-empty, trimmed blocks of a section body.
    pub fn split_blocks<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.block_break
            .split(text.trim())
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .collect()
    }

    pub fn classify(&self, block: &str) -> Option<Block> {
        let lines: Vec<&str> =
            block.lines().map(str::trim_end).filter(|line| !line.trim().is_empty()).collect();
        if lines.is_empty() {
            return None;
        }

        for rule in BlockRule::CHAIN {
            match self.apply(rule, &lines) {
                Ok(Some(classified)) => return Some(classified),
                Ok(None) => {}
                Err(error) => warn!(
                    event_name = "content.block.malformed",
                    rule = rule.as_str(),
                    error = %error,
                    "block did not fit its apparent form; trying the next rule"
                ),
            }
        }

        let joined = lines.iter().map(|line| line.trim()).collect::<Vec<_>>().join(" ");
        Some(Block::Paragraph(self.spans(&joined)))
    }

    fn apply(&self, rule: BlockRule, lines: &[&str]) -> Result<Option<Block>, MalformedBlockError> {
        match rule {
            BlockRule::Table => self.table(lines),
            BlockRule::BulletList => self.bullets(lines),
            BlockRule::NumberedList => self.numbered(lines),
            BlockRule::Headed => Ok(self.headed(lines)),
        }
    }

    fn table(&self, lines: &[&str]) -> Result<Option<Block>, MalformedBlockError> {
        let header = lines[0].trim();
        if !(header.len() > 1 && header.starts_with('|') && header.ends_with('|')) {
            return Ok(None);
        }

        let separator = lines.get(1).map(|line| line.trim()).unwrap_or_default();
        let core: String = separator.chars().filter(|ch| *ch != '|' && *ch != ' ').collect();
        let is_separator = separator.starts_with('|')
            && separator.ends_with('|')
            && !core.is_empty()
            && core.chars().all(|ch| ch == '-' || ch == ':');
        if !is_separator {
            if lines.len() > 1 && lines.iter().all(|line| line.trim_start().starts_with('|')) {
                return Err(MalformedBlockError::TableWithoutSeparator {
                    header: header.to_string(),
                });
            }
            return Ok(None);
        }

        let headers = table_cells(header);
        let width = headers.len();
        let rows = lines[2..]
            .iter()
            .map(|line| line.trim())
            .filter(|line| line.starts_with('|'))
            .map(|line| {
                let mut cells = table_cells(line);
                cells.resize(width, String::new());
                cells
            })
            .collect();

        Ok(Some(Block::Table { headers, rows }))
    }

    fn bullets(&self, lines: &[&str]) -> Result<Option<Block>, MalformedBlockError> {
        let marked = lines.iter().filter(|line| is_bullet(line)).count();
        if marked == lines.len() {
            let items = lines
                .iter()
                .map(|line| self.bullet_prefix.replace(line.trim_start(), "").into_owned())
                .filter(|text| !text.is_empty())
                .map(|text| self.spans(&text))
                .collect();
            return Ok(Some(Block::Bullets(items)));
        }
        partial_list(marked, lines.len())
    }

    fn numbered(&self, lines: &[&str]) -> Result<Option<Block>, MalformedBlockError> {
        let marked = lines.iter().filter(|line| self.numbered.is_match(line)).count();
        if marked == lines.len() {
            let items = lines
                .iter()
                .map(|line| self.numbered_prefix.replace(line, "").into_owned())
                .filter(|text| !text.is_empty())
                .map(|text| self.spans(&text))
                .collect();
            return Ok(Some(Block::Numbered(items)));
        }
        partial_list(marked, lines.len())
    }

    fn headed(&self, lines: &[&str]) -> Option<Block> {
        if !lines.iter().any(|line| self.heading.is_match(line.trim_start())) {
            return None;
        }

        let parts = lines
            .iter()
            .filter_map(|line| {
                let line = line.trim();
                match self.heading.captures(line) {
                    Some(captures) => {
                        let text = captures[2].trim();
                        if text.is_empty() {
                            return None;
                        }
                        let level = (captures[1].len() + 1).min(4) as u8;
                        let text = self.spans(text).into_iter().map(|span| span.text).collect();
                        Some(HeadedLine::Heading { level, text })
                    }
                    None => Some(HeadedLine::Paragraph(self.spans(line))),
                }
            })
            .collect();

        Some(Block::Headed(parts))
    }

    /// Splits `**emphasis**` runs out of a line. A marker pair with nothing
    /// between it, or a marker without a partner, stays literal.
    pub fn spans(&self, text: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = Vec::new();
        let mut cursor = 0;

        for found in self.emphasis.find_iter(text) {
            let inner = &text[found.start() + 2..found.end() - 2];
            if inner.is_empty() {
                continue;
            }
            push_plain(&mut spans, &text[cursor..found.start()]);
            spans.push(Span::emphasized(inner));
            cursor = found.end();
        }
        push_plain(&mut spans, &text[cursor..]);

        spans
    }

    /// Classifies every block of `text` and writes it through `writer`.
    pub fn emit(&self, text: &str, writer: &mut PlanWriter<'_>) {
        for block in self.split_blocks(text) {
            let Some(classified) = self.classify(block) else {
                continue;
            };
            match classified {
                Block::Table { headers, rows } => {
                    writer.table(headers, rows);
                }
                Block::Bullets(items) => {
                    for spans in items {
                        writer.bullet(spans);
                    }
                }
                Block::Numbered(items) => {
                    for spans in items {
                        writer.numbered(spans);
                    }
                }
                Block::Headed(parts) => {
                    for part in parts {
                        match part {
                            HeadedLine::Heading { level, text } => writer.heading(level, text),
                            HeadedLine::Paragraph(spans) => writer.paragraph(spans),
                        };
                    }
                }
                Block::Paragraph(spans) => {
                    writer.paragraph(spans);
                }
            }
        }
    }
}

fn is_bullet(line: &str) -> bool {
    line.trim_start().starts_with(['-', '*', '•'])
}

fn table_cells(line: &str) -> Vec<String> {
    line.trim_matches('|').split('|').map(|cell| cell.trim().to_string()).collect()
}

fn partial_list(marked: usize, total: usize) -> Result<Option<Block>, MalformedBlockError> {
    if marked > 0 && marked * 2 > total {
        Err(MalformedBlockError::PartialList { marked, total })
    } else {
        Ok(None)
    }
}

fn push_plain(spans: &mut Vec<Span>, text: &str) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if !last.emphasis => last.text.push_str(text),
        _ => spans.push(Span::plain(text)),
    }
}
