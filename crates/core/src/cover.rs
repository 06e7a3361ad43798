//! Cover block: facts parsed from the `cover_page` section, plus a
//! best-effort customer name when the cover does not state one.

use chrono::NaiveDate;
use regex::Regex;

use crate::{
    domain::{
        plan::{ParagraphStyle, PlanWriter, Span},
        section::SectionSet,
    },
    tables::DocumentProfile,
};

pub const DATE_FORMAT: &str = "%d %B %Y";

const PLACEHOLDER_TITLES: [&str; 2] = ["cover", "cover page"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverDetails {
    pub project_title: String,
    pub customer: Option<String>,
    pub prepared_by: String,
    pub contents: Vec<String>,
}

impl CoverDetails {
    /// First line is the provisional title; `Project Title:`, `Customer:` and
    /// `Prepared By:` lines override it. Bullets right after `Contents:` are
    /// the listed contents.
    pub fn parse(text: &str, profile: &DocumentProfile) -> Self {
        let lines: Vec<&str> =
            text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();

        let mut details = Self {
            project_title: lines.first().map_or(profile.title.clone(), |line| (*line).to_string()),
            customer: None,
            prepared_by: profile.prepared_by.clone(),
            contents: Vec::new(),
        };

        for (index, line) in lines.iter().enumerate() {
            if let Some(value) = labelled_value(line, "project title:") {
                if !value.is_empty() {
                    details.project_title = value.to_string();
                }
            } else if let Some(value) = labelled_value(line, "customer:") {
                details.customer = Some(value.to_string()).filter(|name| !name.is_empty());
            } else if let Some(value) = labelled_value(line, "prepared by:") {
                if !value.is_empty() {
                    details.prepared_by = value.to_string();
                }
            } else if labelled_value(line, "contents:").is_some() {
                details.contents = lines[index + 1..]
                    .iter()
                    .take_while(|item| item.starts_with(['-', '•', '*']))
                    .map(|item| item.trim_start_matches(['-', '•', '*']).trim().to_string())
                    .collect();
            }
        }

        if PLACEHOLDER_TITLES.contains(&details.project_title.to_lowercase().as_str()) {
            details.project_title = match &details.customer {
                Some(customer) => format!("{} for {customer}", profile.title),
                None => profile.title.clone(),
            };
        }

        details
    }

    pub fn emit(&self, title: &str, issued_on: NaiveDate, writer: &mut PlanWriter<'_>) {
        writer.heading(0, title);
        if let Some(customer) = &self.customer {
            writer.styled(
                ParagraphStyle::Centered,
                vec![Span::emphasized(format!("Prepared for: {customer}"))],
            );
        }

        let row = |label: &str, value: &str| vec![format!("{label}:"), value.to_string()];
        writer.table(
            Vec::new(),
            vec![
                row("Project Title", &self.project_title),
                row("Customer", self.customer.as_deref().unwrap_or("N/A")),
                row("Prepared By", &self.prepared_by),
                row("Date", &issued_on.format(DATE_FORMAT).to_string()),
            ],
        );

        if !self.contents.is_empty() {
            writer.heading(2, "Document Contents");
            for item in &self.contents {
                writer.bullet(vec![Span::plain(item.as_str())]);
            }
        }
        writer.page_break();
    }
}

/// Case-insensitive `label` prefix; returns the trimmed remainder.
fn labelled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label).then(|| line[label.len()..].trim())
}

/// Guesses an organisation name from free text. Not finding one is an
/// ordinary outcome, not an error.
#[derive(Debug)]
pub struct CustomerExtractor {
    organisation: Regex,
    short_form: Regex,
}

impl CustomerExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            organisation: Regex::new(
                r"\b([A-Z][A-Za-z0-9&., ]+\b(?:Limited|Ltd\.?|Pvt\.?|Inc\.?|LLC|Technologies|Systems|Corporation|Corp\.?))",
            )?,
            short_form: Regex::new(r"\b([A-Z][A-Za-z0-9]+ (?:Limited|Technologies))\b")?,
        })
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        [&self.organisation, &self.short_form]
            .into_iter()
            .find_map(|pattern| pattern.captures(text))
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Garbled sections are left out of the scan.
    pub fn extract_from_sections(&self, sections: &SectionSet) -> Option<String> {
        let corpus = sections
            .iter()
            .filter_map(|section| section.validate().ok())
            .collect::<Vec<_>>()
            .join("\n");
        self.extract(&corpus)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{CoverDetails, CustomerExtractor};
    use crate::{
        domain::{
            plan::{DocumentPlan, PlanScope, RenderOp},
            section::{SectionContent, SectionSet},
        },
        tables::DocumentProfile,
    };

    #[test]
    fn labelled_lines_override_the_first_line() {
        let details = CoverDetails::parse(
            "Draft cover\nproject title: Datacenter Refresh\nCustomer: Acme Ltd\n\
             Prepared By: Solutions Team\nContents:\n- Scope\n• Pricing\nClosing words",
            &DocumentProfile::default(),
        );

        assert_eq!(details.project_title, "Datacenter Refresh");
        assert_eq!(details.customer.as_deref(), Some("Acme Ltd"));
        assert_eq!(details.prepared_by, "Solutions Team");
        assert_eq!(details.contents, vec!["Scope", "Pricing"]);
    }

    #[test]
    fn placeholder_title_becomes_the_document_title() {
        let profile = DocumentProfile::default();

        let with_customer = CoverDetails::parse("Cover Page\nCustomer: Globex", &profile);
        assert_eq!(with_customer.project_title, "Professional Services Proposal for Globex");

        let anonymous = CoverDetails::parse("cover", &profile);
        assert_eq!(anonymous.project_title, "Professional Services Proposal");
        assert_eq!(anonymous.customer, None);
    }

    #[test]
    fn empty_cover_uses_profile_defaults() {
        let profile = DocumentProfile::default();
        let details = CoverDetails::parse("", &profile);

        assert_eq!(details.project_title, profile.title);
        assert_eq!(details.prepared_by, profile.prepared_by);
        assert!(details.contents.is_empty());
    }

    #[test]
    fn cover_emits_metadata_table_and_page_break() {
        let details = CoverDetails::parse("Migration Proposal", &DocumentProfile::default());
        let mut plan = DocumentPlan::new();
        let issued_on = NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date");
        details.emit("Professional Services Proposal", issued_on, &mut plan.writer(PlanScope::Cover));

        let ops: Vec<_> = plan.ops().collect();
        assert_eq!(ops.len(), 3);
        let RenderOp::Table { rows, .. } = ops[1] else {
            panic!("expected metadata table, got {:?}", ops[1]);
        };
        assert_eq!(rows[1], vec!["Customer:".to_owned(), "N/A".to_owned()]);
        assert_eq!(rows[3], vec!["Date:".to_owned(), "07 March 2025".to_owned()]);
        assert_eq!(ops[2], &RenderOp::PageBreak);
    }

    #[test]
    fn extractor_finds_organisation_suffixes() {
        let extractor = CustomerExtractor::new().expect("customer regexes compile");

        assert_eq!(
            extractor.extract("Client: Acme Technologies operates three sites."),
            Some("Acme Technologies".to_owned())
        );
        assert_eq!(
            extractor.extract("Umbrella Pvt. Ltd. signed the renewal."),
            Some("Umbrella Pvt. Ltd.".to_owned())
        );
        assert_eq!(extractor.extract("no organisation is named here"), None);
    }

    #[test]
    fn extractor_scans_every_section() {
        let extractor = CustomerExtractor::new().expect("customer regexes compile");
        let sections: SectionSet = [
            SectionContent::new("executive_summary", "a modernisation programme"),
            SectionContent::new("customer_background_and_business_drivers", "Globex Corporation runs"),
        ]
        .into_iter()
        .collect();

        assert_eq!(extractor.extract_from_sections(&sections), Some("Globex Corporation".to_owned()));
    }
}
