//! Canonical grouping and ordering of proposal sections.
//!
//! The taxonomy drives three things: the order sections appear in, the group
//! headings inserted between them, and the static table-of-contents listing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Keys that carry upstream metadata or error payloads, never document text.
pub const EXCLUDED_KEYS: [&str; 11] = [
    "_metadata",
    "_proposal_type",
    "metadata",
    "proposal_type",
    "qa_report",
    "debug_info",
    "error",
    "parse_error",
    "raw_output",
    "exception",
    "final_answer",
];

pub const COVER_KEY: &str = "cover_page";
pub const COMMERCIAL_KEY: &str = "commercial_boq_expanded";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub key: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionGroup {
    pub number: u32,
    pub title: String,
    pub sections: Vec<SectionEntry>,
}

impl SectionGroup {
    pub fn heading(&self) -> String {
        format!("{}. {}", self.number, self.title)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sections.iter().any(|entry| entry.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|entry| entry.key.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Taxonomy {
    groups: Vec<SectionGroup>,
    excluded: HashSet<String>,
    cover_key: String,
}

impl Taxonomy {
    pub fn new(
        groups: Vec<SectionGroup>,
        excluded: impl IntoIterator<Item = String>,
        cover_key: impl Into<String>,
    ) -> Self {
        Self { groups, excluded: excluded.into_iter().collect(), cover_key: cover_key.into() }
    }

    pub fn standard() -> Self {
        let groups: [(&str, &[(&str, &str)]); 8] = [
            (
                "Executive Overview",
                &[
                    ("executive_summary", "Executive Summary"),
                    ("about_tech9labs", "About Integrated Tech9 Labs"),
                ],
            ),
            (
                "Customer Context & Requirements",
                &[
                    (
                        "customer_background_and_business_drivers",
                        "Customer Background & Business Drivers",
                    ),
                    ("current_infrastructure_assessment", "Current Infrastructure Assessment"),
                ],
            ),
            (
                "Technical Solution Architecture",
                &[
                    ("target_state_architecture", "Target State Architecture"),
                    ("migration_strategy_and_approach", "Migration Strategy & Approach"),
                    ("parallel_build_approach", "Parallel Build Methodology"),
                    ("migration_waves", "Wave-Based Migration Plan"),
                    ("rollback_strategy", "Rollback & Contingency Strategy"),
                    ("validation_strategy", "Validation & Testing Strategy"),
                ],
            ),
            (
                "Scope of Work & Deliverables",
                &[
                    ("scope_of_work_in_scope", "In-Scope Activities"),
                    ("scope_of_work_out_of_scope", "Out-of-Scope Items"),
                    ("detailed_wbs", "Work Breakdown Structure (WBS)"),
                    ("tools_and_technologies", "Tools & Technologies"),
                    ("deployment_and_configuration_details", "Deployment & Configuration Details"),
                    (
                        "testing_validation_and_acceptance",
                        "Testing, Validation & Acceptance Criteria",
                    ),
                    ("project_deliverables", "Project Deliverables"),
                ],
            ),
            (
                "Project Governance & Management",
                &[
                    ("project_governance", "Governance Framework"),
                    ("raci_matrix", "RACI Matrix"),
                    ("communication_plan", "Communication Plan"),
                    ("escalation_matrix", "Escalation Procedures"),
                ],
            ),
            (
                "Risk Management & Dependencies",
                &[
                    ("assumptions_and_dependencies", "Assumptions & Dependencies"),
                    ("risks_and_mitigation", "Risk Register & Mitigation Strategies"),
                ],
            ),
            (
                "Commercial & Timeline",
                &[
                    (COMMERCIAL_KEY, "Commercial Bill of Quantities"),
                    ("project_timeline", "Project Timeline & Milestones"),
                ],
            ),
            (
                "Annexures & References",
                &[("annexures", "Annexures & Supporting Documentation")],
            ),
        ];

        let groups = groups
            .iter()
            .zip(1..)
            .map(|((title, sections), number)| SectionGroup {
                number,
                title: (*title).to_string(),
                sections: sections
                    .iter()
                    .map(|(key, title)| SectionEntry {
                        key: (*key).to_string(),
                        title: (*title).to_string(),
                    })
                    .collect(),
            })
            .collect();

        Self::new(groups, EXCLUDED_KEYS.iter().map(|key| (*key).to_string()), COVER_KEY)
    }

    pub fn groups(&self) -> &[SectionGroup] {
        &self.groups
    }

    pub fn cover_key(&self) -> &str {
        &self.cover_key
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded.contains(key)
    }

    /// Owning group of a key, if the taxonomy knows it.
    pub fn group_for(&self, key: &str) -> Option<&SectionGroup> {
        self.groups.iter().find(|group| group.contains(key))
    }

    pub fn title_for(&self, key: &str) -> String {
        self.groups
            .iter()
            .flat_map(|group| group.sections.iter())
            .find(|entry| entry.key == key)
            .map(|entry| entry.title.clone())
            .unwrap_or_else(|| humanize_key(key))
    }

    /// Orders the present keys: taxonomy groups first, in taxonomy order,
    /// then unknown keys in first-seen order. Excluded keys and the cover key
    /// never appear; no key appears twice.
    pub fn order<'a, I>(&self, present: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let present: Vec<&str> = present
            .into_iter()
            .filter(|key| !self.is_excluded(key) && *key != self.cover_key)
            .collect();
        let lookup: HashSet<&str> = present.iter().copied().collect();

        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(present.len());

        for group in &self.groups {
            for key in group.keys() {
                if lookup.contains(key) && seen.insert(key.to_string()) {
                    ordered.push(key.to_string());
                }
            }
        }

        for key in present {
            if seen.insert(key.to_string()) {
                ordered.push(key.to_string());
            }
        }

        ordered
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::standard()
    }
}

/// `current_state_notes` -> `Current State Notes`.
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{humanize_key, SectionEntry, SectionGroup, Taxonomy, COMMERCIAL_KEY};

    #[test]
    fn known_keys_follow_taxonomy_and_unknown_keys_trail() {
        let taxonomy = Taxonomy::standard();
        let ordered =
            taxonomy.order(["risks_and_mitigation", "executive_summary", "unknown_key"]);

        assert_eq!(ordered, vec!["executive_summary", "risks_and_mitigation", "unknown_key"]);
    }

    #[test]
    fn excluded_and_cover_keys_are_dropped() {
        let taxonomy = Taxonomy::standard();
        let ordered = taxonomy.order([
            "qa_report",
            "cover_page",
            "annexures",
            "final_answer",
            "_metadata",
            "raw_output",
        ]);

        assert_eq!(ordered, vec!["annexures"]);
    }

    #[test]
    fn unknown_keys_keep_first_seen_order_without_duplicates() {
        let taxonomy = Taxonomy::standard();
        let ordered = taxonomy.order(["zeta", "alpha", "zeta", "project_timeline", "alpha"]);

        assert_eq!(ordered, vec!["project_timeline", "zeta", "alpha"]);
    }

    #[test]
    fn a_key_listed_in_two_groups_is_emitted_once() {
        let entry = |key: &str| SectionEntry { key: key.to_owned(), title: key.to_owned() };
        let taxonomy = Taxonomy::new(
            vec![
                SectionGroup { number: 1, title: "A".to_owned(), sections: vec![entry("x")] },
                SectionGroup {
                    number: 2,
                    title: "B".to_owned(),
                    sections: vec![entry("y"), entry("x")],
                },
            ],
            Vec::new(),
            "cover",
        );

        assert_eq!(taxonomy.order(["y", "x"]), vec!["x", "y"]);
    }

    #[test]
    fn reverse_lookup_finds_owning_group() {
        let taxonomy = Taxonomy::standard();

        let group = taxonomy.group_for(COMMERCIAL_KEY).expect("commercial group");
        assert_eq!(group.heading(), "7. Commercial & Timeline");
        assert!(taxonomy.group_for("unknown_key").is_none());
    }

    #[test]
    fn titles_fall_back_to_humanized_keys() {
        let taxonomy = Taxonomy::standard();

        assert_eq!(taxonomy.title_for("raci_matrix"), "RACI Matrix");
        assert_eq!(taxonomy.title_for("vendor_NOTES_extra"), "Vendor Notes Extra");
        assert_eq!(humanize_key("_leading__gaps_"), "Leading Gaps");
    }

    #[test]
    fn standard_taxonomy_has_eight_numbered_groups() {
        let taxonomy = Taxonomy::standard();
        let numbers: Vec<u32> = taxonomy.groups().iter().map(|group| group.number).collect();

        assert_eq!(numbers, (1..=8).collect::<Vec<u32>>());
    }
}
