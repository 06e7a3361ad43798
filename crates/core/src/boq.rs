//! Billable effort extraction from free-text BOQ lines.
//!
//! Man-days come from an ordered chain of rules; the first rule whose
//! pattern matches decides. When every rule misses, the effort table supplies a
//! keyword default, and failing that the line becomes an uncosted
//! placeholder.

use regex::Regex;
use std::num::ParseIntError;

use tracing::{info, warn};

use crate::{
    domain::boq::{BoqLine, EffortSource, ServiceLine},
    tables::EffortTable,
};

const DROPPED_MARKERS: [&str; 3] = ["total project cost", "grand total", "subtotal"];

/// Short-form service lists skip anything that reads like a rollup or a
/// phase banner.
const SERVICE_SKIP_MARKERS: [&str; 2] = ["total", "phase"];
const SERVICE_DEFAULT_DAYS: u32 = 5;

const FALLBACK_SERVICE: &str = "Professional Services - Implementation";
const FALLBACK_SERVICE_DAYS: u32 = 30;
pub const GENERAL_CATEGORY: &str = "General Services";

/// Category keywords for short-form services, checked in order.
const SERVICE_CATEGORIES: [(&str, &[&str]); 6] = [
    ("Assessment Services", &["assessment", "analyze", "review", "audit"]),
    ("Migration Services", &["migration", "move", "transfer", "cutover"]),
    ("Deployment Services", &["deploy", "implement", "install", "setup"]),
    ("Development Services", &["develop", "custom", "integration", "build"]),
    ("Testing Services", &["test", "validation", "verify", "uat"]),
    ("Training & Support", &["training", "knowledge", "documentation", "handover"]),
];

#[derive(Debug)]
struct ManDayRule {
    name: &'static str,
    pattern: Regex,
}

impl ManDayRule {
    fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { name, pattern: Regex::new(pattern)? })
    }

    /// `None` when the pattern misses; `Some(Err(_))` when it matched a count
    /// that does not fit in `u32`.
    fn extract(&self, line: &str) -> Option<Result<u32, ParseIntError>> {
        Some(self.pattern.captures(line)?.get(1)?.as_str().parse())
    }
}

#[derive(Debug)]
pub struct BoqParser {
    rules: Vec<ManDayRule>,
    bullet: Regex,
    delimiter: Regex,
    trailing_digits: Regex,
    effort: EffortTable,
}

impl BoqParser {
    pub fn new(effort: EffortTable) -> Result<Self, regex::Error> {
        Ok(Self {
            rules: vec![
                ManDayRule::new("man_days_suffix", r"(?i)(\d+)\s*(?:man[-\s]?days?|days?)")?,
                ManDayRule::new("bracketed", r"[\(\[](\d+)[\)\]]")?,
                ManDayRule::new("after_delimiter", r"(?:→|->|:)\s*(\d+)")?,
                ManDayRule::new("trailing", r"\s(\d+)\s*$")?,
            ],
            bullet: Regex::new(r"^[-*•]\s*")?,
            delimiter: Regex::new(r"→|->|:|\(|\[|—|-{2,}|\t")?,
            trailing_digits: Regex::new(r"\s*\d+\s*$")?,
            effort,
        })
    }

    /// Reads one line. `None` for blank lines and total/subtotal rollups.
    pub fn parse_line(&self, raw: &str) -> Option<BoqLine> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || contains_any(trimmed, &DROPPED_MARKERS) {
            return None;
        }

        let line = self.bullet.replace(trimmed, "");
        let description = self.description(&line, trimmed);

        let explicit = self
            .rules
            .iter()
            .find_map(|rule| rule.extract(&line).map(|days| (rule.name, days)));

        let (man_days, effort_source) = match explicit {
            Some((rule, Ok(days))) if days > 0 => {
                (days, EffortSource::Explicit { rule: rule.to_string() })
            }
            Some((rule, Err(error))) => {
                warn!(
                    event_name = "boq.man_days.out_of_range",
                    description = %description,
                    rule,
                    error = %error,
                    "explicit man-day count is out of range; line left uncosted"
                );
                (0, EffortSource::Unresolved)
            }
            _ => self.keyword_default(&description),
        };

        Some(BoqLine { description, man_days, effort_source })
    }

    pub fn parse_section(&self, text: &str) -> Vec<BoqLine> {
        text.lines().filter_map(|line| self.parse_line(line)).collect()
    }

    /// Short-form service list. Never empty: with nothing usable the single
    /// fallback service stands in.
    pub fn parse_services(&self, text: &str) -> Vec<ServiceLine> {
        let man_days_rule = &self.rules[0];
        let mut services: Vec<ServiceLine> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !contains_any(line, &SERVICE_SKIP_MARKERS))
            .filter_map(|line| {
                let man_days = match man_days_rule.extract(line) {
                    None => SERVICE_DEFAULT_DAYS,
                    Some(Ok(days)) => days,
                    Some(Err(error)) => {
                        warn!(
                            event_name = "boq.man_days.out_of_range",
                            line,
                            error = %error,
                            "skipping service with an out-of-range man-day count"
                        );
                        return None;
                    }
                };
                let description = self.bullet.replace(line, "");
                let description = self.description(&description, line);
                if description.chars().count() <= 3 {
                    return None;
                }
                let category = service_category(&description).to_string();
                Some(ServiceLine { description, category, man_days })
            })
            .collect();

        if services.is_empty() {
            info!(
                event_name = "boq.services.fallback",
                man_days = FALLBACK_SERVICE_DAYS,
                "no services recognised in client BOQ; using the default engagement line"
            );
            services.push(ServiceLine {
                description: FALLBACK_SERVICE.to_string(),
                category: GENERAL_CATEGORY.to_string(),
                man_days: FALLBACK_SERVICE_DAYS,
            });
        }
        services
    }

    /// Text before the first delimiter, minus stray trailing digits. Falls
    /// back to the whole trimmed line when that leaves nothing.
    fn description(&self, line: &str, original: &str) -> String {
        let head = self.delimiter.split(line).next().unwrap_or_default().trim();
        let head = self.trailing_digits.replace(head, "");
        let head = head.trim();
        if head.is_empty() {
            original.trim().to_string()
        } else {
            head.to_string()
        }
    }

    fn keyword_default(&self, description: &str) -> (u32, EffortSource) {
        if description.is_empty() {
            return (0, EffortSource::Unresolved);
        }
        match self.effort.lookup(description) {
            Some((keyword, days)) => {
                info!(
                    event_name = "boq.man_days.defaulted",
                    description,
                    keyword,
                    man_days = days,
                    "assigned default man-days from keyword"
                );
                (days, EffortSource::KeywordDefault { keyword: keyword.to_string() })
            }
            None => (0, EffortSource::Unresolved),
        }
    }
}

fn contains_any(line: &str, markers: &[&str]) -> bool {
    let lowered = line.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}

pub fn service_category(description: &str) -> &'static str {
    let lowered = description.to_lowercase();
    SERVICE_CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or(GENERAL_CATEGORY)
}
