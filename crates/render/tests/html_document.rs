use chrono::NaiveDate;
use propkit_core::{EngineTables, FxResolver, ProposalEngine, SectionContent, SectionSet};
use propkit_render::HtmlRenderer;
use rust_decimal::Decimal;

#[tokio::test]
async fn detailed_proposal_renders_to_a_single_html_page() {
    let engine =
        ProposalEngine::new(EngineTables::default(), FxResolver::offline(Decimal::new(8795, 2)))
            .expect("engine builds");
    let sections: SectionSet = [
        SectionContent::new("cover_page", "Cover\nCustomer: Stark Industries"),
        SectionContent::new("executive_summary", "## Goals\nCut **hosting** spend."),
        SectionContent::new(
            "commercial_boq_expanded",
            "Platform assessment → 5 man-days\nKickoff",
        ),
    ]
    .into_iter()
    .collect();
    let issued_on = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");

    let outcome = engine
        .build_detailed(&sections, issued_on, HtmlRenderer::new("Prepared with propkit").expect("renderer"))
        .await
        .expect("build succeeds");
    let html = outcome.artifact;

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Professional Services Proposal</title>"));
    assert!(html.contains("Prepared for: Stark Industries"));
    assert!(html.contains("<td>Date:</td><td>30 June 2025</td>"));
    assert!(html.contains("<th>Total INR Cost</th>"));
    let na = "<td>N&#x2F;A</td>";
    assert!(html.contains(&format!("<td>Kickoff</td>{}", na.repeat(4))));
    assert!(html.contains("Cut <strong>hosting</strong> spend."));
    assert!(html.contains("<footer>Prepared with propkit</footer>"));
    assert!(html.matches(r#"class="page-break""#).count() >= 3);
}
