//! The renderer collaborator seam.
//!
//! A renderer receives the plan one operation at a time and produces the
//! final artifact in `finish`. It owns pagination, fonts and encoding; the
//! engine never sees any of that.

use thiserror::Error;

use crate::{
    domain::plan::{DocumentPlan, ParagraphStyle, PlanScope, RenderOp, Span},
    errors::AssemblyError,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("renderer rejected operation: {0}")]
    Rejected(String),
    #[error("renderer could not produce output: {0}")]
    Output(String),
}

pub trait Renderer {
    type Output;

    fn add_heading(&mut self, level: u8, text: &str) -> Result<(), RenderError>;
    fn add_paragraph(&mut self, spans: &[Span], style: ParagraphStyle) -> Result<(), RenderError>;
    fn add_table(&mut self, headers: &[String], rows: &[Vec<String>]) -> Result<(), RenderError>;
    fn add_bullet(&mut self, spans: &[Span]) -> Result<(), RenderError>;
    fn add_numbered(&mut self, spans: &[Span]) -> Result<(), RenderError>;
    fn add_toc_entry(&mut self, depth: u8, number: &str, title: &str) -> Result<(), RenderError>;
    fn add_page_break(&mut self) -> Result<(), RenderError>;

    fn finish(self) -> Result<Self::Output, RenderError>;
}

fn apply<R: Renderer>(renderer: &mut R, op: &RenderOp) -> Result<(), RenderError> {
    match op {
        RenderOp::Heading { level, text } => renderer.add_heading(*level, text),
        RenderOp::Paragraph { spans, style } => renderer.add_paragraph(spans, *style),
        RenderOp::Table { headers, rows } => renderer.add_table(headers, rows),
        RenderOp::Bullet { spans } => renderer.add_bullet(spans),
        RenderOp::Numbered { spans } => renderer.add_numbered(spans),
        RenderOp::TocEntry { depth, number, title } => renderer.add_toc_entry(*depth, number, title),
        RenderOp::PageBreak => renderer.add_page_break(),
    }
}

/// Streams the plan into `renderer`. The first failure stops delivery and is
/// tagged with the part of the document being processed.
pub fn deliver<R: Renderer>(plan: &DocumentPlan, mut renderer: R) -> Result<R::Output, AssemblyError> {
    for step in plan.steps() {
        apply(&mut renderer, &step.op)
            .map_err(|source| AssemblyError::Render { scope: step.scope.clone(), source })?;
    }
    renderer.finish().map_err(|source| AssemblyError::Render { scope: PlanScope::Output, source })
}

#[cfg(test)]
mod tests {
    use super::{deliver, RenderError, Renderer};
    use crate::{
        domain::plan::{DocumentPlan, ParagraphStyle, PlanScope, Span},
        errors::AssemblyError,
    };

    /// Counts operations and fails on the first table when asked to.
    #[derive(Default)]
    struct CountingRenderer {
        ops: usize,
        reject_tables: bool,
        fail_finish: bool,
    }

    impl Renderer for CountingRenderer {
        type Output = usize;

        fn add_heading(&mut self, _level: u8, _text: &str) -> Result<(), RenderError> {
            self.ops += 1;
            Ok(())
        }

        fn add_paragraph(&mut self, _spans: &[Span], _style: ParagraphStyle) -> Result<(), RenderError> {
            self.ops += 1;
            Ok(())
        }

        fn add_table(&mut self, _headers: &[String], _rows: &[Vec<String>]) -> Result<(), RenderError> {
            if self.reject_tables {
                return Err(RenderError::Rejected("tables unsupported".to_owned()));
            }
            self.ops += 1;
            Ok(())
        }

        fn add_bullet(&mut self, _spans: &[Span]) -> Result<(), RenderError> {
            self.ops += 1;
            Ok(())
        }

        fn add_numbered(&mut self, _spans: &[Span]) -> Result<(), RenderError> {
            self.ops += 1;
            Ok(())
        }

        fn add_toc_entry(&mut self, _depth: u8, _number: &str, _title: &str) -> Result<(), RenderError> {
            self.ops += 1;
            Ok(())
        }

        fn add_page_break(&mut self) -> Result<(), RenderError> {
            self.ops += 1;
            Ok(())
        }

        fn finish(self) -> Result<usize, RenderError> {
            if self.fail_finish {
                return Err(RenderError::Output("sink closed".to_owned()));
            }
            Ok(self.ops)
        }
    }

    fn sample_plan() -> DocumentPlan {
        let mut plan = DocumentPlan::new();
        plan.writer(PlanScope::Cover).heading(0, "Proposal").page_break();
        plan.writer(PlanScope::Section("commercial_boq_expanded".to_owned()))
            .heading(1, "Commercial")
            .table(vec!["Services".to_owned()], Vec::new());
        plan
    }

    #[test]
    fn every_operation_reaches_the_renderer() {
        assert_eq!(deliver(&sample_plan(), CountingRenderer::default()), Ok(4));
    }

    #[test]
    fn failure_identifies_the_section() {
        let renderer = CountingRenderer { reject_tables: true, ..CountingRenderer::default() };
        let error = deliver(&sample_plan(), renderer).expect_err("table rejected");

        assert_eq!(error.scope(), Some(&PlanScope::Section("commercial_boq_expanded".to_owned())));
    }

    #[test]
    fn finish_failure_is_tagged_as_output() {
        let renderer = CountingRenderer { fail_finish: true, ..CountingRenderer::default() };

        assert!(matches!(
            deliver(&sample_plan(), renderer),
            Err(AssemblyError::Render { scope: PlanScope::Output, .. })
        ));
    }
}
