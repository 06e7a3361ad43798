use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream section text that cannot be rendered as-is. Recovered by a
/// diagnostic placeholder in place of the section body.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UpstreamContentError {
    #[error("section `{key}` contains {count} replacement character(s) from a lossy decode")]
    ReplacementCharacters { key: String, count: usize },
    #[error("section `{key}` contains control character U+{code:04X}")]
    ControlCharacter { key: String, code: u32 },
    #[error("section mapping must be a JSON object, found {found}")]
    NotAMapping { found: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionContent {
    key: String,
    text: String,
}

impl SectionContent {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self { key: key.into(), text: text.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Checks that the text survived upstream decoding intact.
    pub fn validate(&self) -> Result<&str, UpstreamContentError> {
        let count = self.text.chars().filter(|ch| *ch == char::REPLACEMENT_CHARACTER).count();
        if count > 0 {
            return Err(UpstreamContentError::ReplacementCharacters {
                key: self.key.clone(),
                count,
            });
        }

        if let Some(ch) =
            self.text.chars().find(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        {
            return Err(UpstreamContentError::ControlCharacter {
                key: self.key.clone(),
                code: u32::from(ch),
            });
        }

        Ok(&self.text)
    }
}

/// Normalized sections in first-seen order. Keys are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSet {
    sections: Vec<SectionContent>,
}

impl SectionSet {
    /// Inserts or replaces a section; a replaced section keeps its position.
    pub fn insert(&mut self, section: SectionContent) {
        match self.sections.iter_mut().find(|existing| existing.key == section.key) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SectionContent> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).map(SectionContent::text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(SectionContent::key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionContent> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl FromIterator<SectionContent> for SectionSet {
    fn from_iter<T: IntoIterator<Item = SectionContent>>(iter: T) -> Self {
        let mut set = Self::default();
        for section in iter {
            set.insert(section);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::{SectionContent, SectionSet, UpstreamContentError};

    #[test]
    fn clean_text_validates() {
        let section = SectionContent::new("executive_summary", "Line one\n\tLine two\r\n");
        assert_eq!(section.validate(), Ok("Line one\n\tLine two\r\n"));
    }

    #[test]
    fn replacement_characters_are_rejected() {
        let section = SectionContent::new("annexures", "Broken \u{FFFD}\u{FFFD} bytes");
        assert_eq!(
            section.validate(),
            Err(UpstreamContentError::ReplacementCharacters {
                key: "annexures".to_owned(),
                count: 2
            })
        );
    }

    #[test]
    fn stray_control_characters_are_rejected() {
        let section = SectionContent::new("raci_matrix", "abc\u{0007}def");
        assert!(matches!(
            section.validate(),
            Err(UpstreamContentError::ControlCharacter { code: 7, .. })
        ));
    }

    #[test]
    fn set_keeps_first_seen_order_and_replaces_in_place() {
        let set: SectionSet = [
            SectionContent::new("b", "1"),
            SectionContent::new("a", "2"),
            SectionContent::new("b", "3"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.text("b"), Some("3"));
        assert_eq!(set.len(), 2);
    }
}
