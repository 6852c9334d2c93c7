//! Skill categories for unit materials
//!
//! Every behavior that depends on a material's skill lives in one table:
//! the material type tag sent to the store, and whether the listening
//! script/translation fields apply.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Skill a material trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SkillCategory {
    Listening,
    Kanji,
    Reading,
    Writing,
    Grammar,
    Vocab,
}

/// Per-skill behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillProfile {
    pub category: SkillCategory,
    /// Uppercase token as it appears in form values and identifiers
    pub token: &'static str,
    /// Material type tag stored on the record
    pub material_type: &'static str,
    /// Whether script and translation are sent with the material
    pub has_transcript: bool,
}

const SKILL_TABLE: [SkillProfile; 6] = [
    SkillProfile {
        category: SkillCategory::Listening,
        token: "LISTENING",
        material_type: "LISTENING",
        has_transcript: true,
    },
    SkillProfile {
        category: SkillCategory::Kanji,
        token: "KANJI",
        material_type: "KANJI",
        has_transcript: false,
    },
    SkillProfile {
        category: SkillCategory::Reading,
        token: "READING",
        material_type: "READING",
        has_transcript: false,
    },
    SkillProfile {
        category: SkillCategory::Writing,
        token: "WRITING",
        material_type: "WRITING",
        has_transcript: false,
    },
    SkillProfile {
        category: SkillCategory::Grammar,
        token: "GRAMMAR",
        material_type: "GRAMMAR",
        has_transcript: false,
    },
    SkillProfile {
        category: SkillCategory::Vocab,
        token: "VOCAB",
        material_type: "VOCAB",
        has_transcript: false,
    },
];

impl SkillCategory {
    pub const ALL: [SkillCategory; 6] = [
        SkillCategory::Listening,
        SkillCategory::Kanji,
        SkillCategory::Reading,
        SkillCategory::Writing,
        SkillCategory::Grammar,
        SkillCategory::Vocab,
    ];

    /// Look up this category's row in the skill table
    pub fn profile(&self) -> &'static SkillProfile {
        // Table rows are declared in enum order
        &SKILL_TABLE[*self as usize]
    }

    /// Parse from the uppercase token (case-sensitive, as in identifiers)
    pub fn from_token(token: &str) -> Option<Self> {
        SKILL_TABLE
            .iter()
            .find(|p| p.token == token)
            .map(|p| p.category)
    }

    pub fn as_str(&self) -> &'static str {
        self.profile().token
    }

    pub fn material_type(&self) -> &'static str {
        self.profile().material_type
    }

    pub fn has_transcript(&self) -> bool {
        self.profile().has_transcript
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_enum_order() {
        for category in SkillCategory::ALL {
            assert_eq!(category.profile().category, category);
        }
    }

    #[test]
    fn test_only_listening_has_transcript() {
        let with_transcript: Vec<_> = SkillCategory::ALL
            .iter()
            .filter(|c| c.has_transcript())
            .collect();
        assert_eq!(with_transcript, vec![&SkillCategory::Listening]);
    }

    #[test]
    fn test_from_token() {
        assert_eq!(SkillCategory::from_token("KANJI"), Some(SkillCategory::Kanji));
        assert_eq!(SkillCategory::from_token("kanji"), None);
        assert_eq!(SkillCategory::from_token("SPEAKING"), None);
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&SkillCategory::Vocab).unwrap();
        assert_eq!(json, "\"VOCAB\"");
        let parsed: SkillCategory = serde_json::from_str("\"LISTENING\"").unwrap();
        assert_eq!(parsed, SkillCategory::Listening);
    }
}
