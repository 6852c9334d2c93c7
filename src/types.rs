//! Curriculum types shared by the store client and the pipeline

use crate::skill::SkillCategory;
use serde::{Deserialize, Serialize};

// ============================================================================
// Chapters and Units
// ============================================================================

/// Chapter within a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub course_id: String,
    #[serde(default)]
    pub prerequisite_chapter_id: Option<String>,
}

/// Unit publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitStatus {
    Active,
    #[default]
    Inactive,
}

/// Unit within a chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: UnitStatus,
    pub chapter_id: String,
    #[serde(default)]
    pub prerequisite_unit_id: Option<String>,
}

/// Input for creating a unit
///
/// The id is chosen client-side so a repeated run for the same logical
/// unit addresses the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: UnitStatus,
    pub chapter_id: String,
    #[serde(default)]
    pub prerequisite_unit_id: Option<String>,
}

impl UnitDraft {
    /// New inactive unit with a generated id
    pub fn new(title: impl Into<String>, chapter_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            status: UnitStatus::Inactive,
            chapter_id: chapter_id.into(),
            prerequisite_unit_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_prerequisite(mut self, unit_id: impl Into<String>) -> Self {
        self.prerequisite_unit_id = Some(unit_id.into());
        self
    }
}

// ============================================================================
// Materials
// ============================================================================

/// File picked by the author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type reported by the picker, if any
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: None,
            data,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Lowercased extension after the last dot, if any
    pub fn extension(&self) -> Option<String> {
        match self.name.rfind('.') {
            Some(pos) if pos > 0 => Some(self.name[pos + 1..].to_ascii_lowercase()),
            _ => None,
        }
    }

    /// MIME type to send with the upload
    pub fn content_type(&self) -> &str {
        if let Some(ref mime) = self.mime_type {
            return mime;
        }
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("mp3") => "audio/mpeg",
            _ => "application/octet-stream",
        }
    }
}

/// Material slot filled in by the author
///
/// A slot with no skill or no file is an unfilled optional slot and is
/// skipped by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialDraft {
    pub skill_category: Option<SkillCategory>,
    pub selected_file: Option<SelectedFile>,
    /// Listening script (LISTENING only)
    pub script: Option<String>,
    /// Listening translation (LISTENING only)
    pub translation: Option<String>,
}

impl MaterialDraft {
    pub fn new(skill_category: SkillCategory, file: SelectedFile) -> Self {
        Self {
            skill_category: Some(skill_category),
            selected_file: Some(file),
            script: None,
            translation: None,
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// Skill and file, when both are set
    pub fn filled(&self) -> Option<(SkillCategory, &SelectedFile)> {
        match (self.skill_category, self.selected_file.as_ref()) {
            (Some(skill), Some(file)) => Some((skill, file)),
            _ => None,
        }
    }
}

/// Material record from the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub file_url: String,
    pub material_type: String,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    pub unit_id: String,
}

/// Input for registering a material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMaterialInput {
    /// Derived identifier, becomes the primary key
    pub id: String,
    /// Stored file reference returned by the upload
    pub file_url: String,
    pub material_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub unit_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_and_content_type() {
        let pdf = SelectedFile::new("Lesson 1.PDF", vec![1, 2, 3]);
        assert_eq!(pdf.size, 3);
        assert_eq!(pdf.extension().as_deref(), Some("pdf"));
        assert_eq!(pdf.content_type(), "application/pdf");

        let hidden = SelectedFile::new(".mp3", vec![]);
        assert_eq!(hidden.extension(), None);

        let tagged = SelectedFile::new("audio", vec![]).with_mime_type("audio/mpeg");
        assert_eq!(tagged.content_type(), "audio/mpeg");
    }

    #[test]
    fn test_draft_filled() {
        let empty = MaterialDraft::default();
        assert!(empty.filled().is_none());

        let half = MaterialDraft {
            skill_category: Some(SkillCategory::Kanji),
            ..Default::default()
        };
        assert!(half.filled().is_none());

        let full = MaterialDraft::new(SkillCategory::Kanji, SelectedFile::new("a.pdf", vec![]));
        assert_eq!(full.filled().map(|(s, _)| s), Some(SkillCategory::Kanji));
    }

    #[test]
    fn test_unit_draft_defaults() {
        let a = UnitDraft::new("Greetings", "ch-1");
        let b = UnitDraft::new("Greetings", "ch-1");
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, UnitStatus::Inactive);

        let pinned = a.clone().with_id("unit-7");
        assert_eq!(pinned.id, "unit-7");
    }

    #[test]
    fn test_material_input_omits_empty_transcript() {
        let input = CreateMaterialInput {
            id: "X".into(),
            file_url: "sha256-abc".into(),
            material_type: "KANJI".into(),
            script: None,
            translation: None,
            unit_id: "u1".into(),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("script").is_none());
        assert_eq!(json["unit_id"], "u1");
    }
}
