use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub emphasis: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), emphasis: false }
    }

    pub fn emphasized(text: impl Into<String>) -> Self {
        Self { text: text.into(), emphasis: true }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    #[default]
    Body,
    /// Small print: disclosures, instructions, confidentiality notices.
    Note,
    Centered,
}

/// One instruction for the renderer collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderOp {
    /// Level 0 is the document title; 1-4 are section levels.
    Heading { level: u8, text: String },
    Paragraph { spans: Vec<Span>, style: ParagraphStyle },
    Table { headers: Vec<String>, rows: Vec<Vec<String>> },
    Bullet { spans: Vec<Span> },
    Numbered { spans: Vec<Span> },
    /// Contents line; the renderer owns the page number.
    TocEntry { depth: u8, number: String, title: String },
    PageBreak,
}

/// Which part of the document an operation belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum PlanScope {
    Cover,
    Contents,
    Section(String),
    /// The renderer's final output step, after every operation was accepted.
    Output,
}

impl fmt::Display for PlanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cover => f.write_str("cover block"),
            Self::Contents => f.write_str("table of contents"),
            Self::Section(key) => write!(f, "section `{key}`"),
            Self::Output => f.write_str("document output"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub scope: PlanScope,
    pub op: RenderOp,
}

/// Linear operation stream for one build. Built once, consumed by the
/// renderer, then dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPlan {
    steps: Vec<PlanStep>,
}

impl DocumentPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writer(&mut self, scope: PlanScope) -> PlanWriter<'_> {
        PlanWriter { plan: self, scope }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn ops(&self) -> impl Iterator<Item = &RenderOp> {
        self.steps.iter().map(|step| &step.op)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Operations belonging to one scope, in order.
    pub fn ops_for<'a>(&'a self, scope: &'a PlanScope) -> impl Iterator<Item = &'a RenderOp> {
        self.steps.iter().filter(move |step| &step.scope == scope).map(|step| &step.op)
    }
}

pub struct PlanWriter<'a> {
    plan: &'a mut DocumentPlan,
    scope: PlanScope,
}

impl PlanWriter<'_> {
    pub fn push(&mut self, op: RenderOp) -> &mut Self {
        self.plan.steps.push(PlanStep { scope: self.scope.clone(), op });
        self
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) -> &mut Self {
        self.push(RenderOp::Heading { level, text: text.into() })
    }

    pub fn paragraph(&mut self, spans: Vec<Span>) -> &mut Self {
        self.push(RenderOp::Paragraph { spans, style: ParagraphStyle::Body })
    }

    pub fn styled(&mut self, style: ParagraphStyle, spans: Vec<Span>) -> &mut Self {
        self.push(RenderOp::Paragraph { spans, style })
    }

    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.paragraph(vec![Span::plain(text)])
    }

    pub fn note(&mut self, text: impl Into<String>) -> &mut Self {
        self.styled(ParagraphStyle::Note, vec![Span::plain(text)])
    }

    /// `Label: value` with the label emphasized.
    pub fn labelled(&mut self, label: &str, value: impl Into<String>) -> &mut Self {
        self.paragraph(vec![Span::emphasized(format!("{label}: ")), Span::plain(value)])
    }

    pub fn table(&mut self, headers: Vec<String>, rows: Vec<Vec<String>>) -> &mut Self {
        self.push(RenderOp::Table { headers, rows })
    }

    pub fn bullet(&mut self, spans: Vec<Span>) -> &mut Self {
        self.push(RenderOp::Bullet { spans })
    }

    pub fn numbered(&mut self, spans: Vec<Span>) -> &mut Self {
        self.push(RenderOp::Numbered { spans })
    }

    pub fn toc_entry(
        &mut self,
        depth: u8,
        number: impl Into<String>,
        title: impl Into<String>,
    ) -> &mut Self {
        self.push(RenderOp::TocEntry { depth, number: number.into(), title: title.into() })
    }

    pub fn page_break(&mut self) -> &mut Self {
        self.push(RenderOp::PageBreak)
    }
}
