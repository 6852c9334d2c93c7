//! Unit provisioning pipeline
//!
//! Creates a unit and then uploads and registers its materials, one at a
//! time.
//!
//! ## Stages
//!
//! ```text
//! Validate ──► CreateParent ──► Settle ──► ProvisionChildren
//!    │              │                         │
//!    │ (no calls)   │ (no materials)          │ (stop at first failure)
//!    ▼              ▼                         ▼
//!  failure        failure            partial failure / success
//! ```
//!
//! Every failure comes back as data in [`PipelineResult`]. Nothing is
//! retried, and a unit that was created stays created even when none of
//! its materials make it.

use crate::config::PipelineConfig;
use crate::error::{ChildStep, DraftError, ProvisioningError, ValidationError};
use crate::identifier::{
    check_pending, check_uniqueness, derive_identifier, validate_file, validate_format,
    Uniqueness,
};
use crate::skill::SkillCategory;
use crate::store::ContentStore;
use crate::types::{CreateMaterialInput, Material, MaterialDraft, SelectedFile, Unit, UnitDraft};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

// ============================================================================
// Types
// ============================================================================

/// Pipeline stage that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Validate,
    CreateParent,
    ProvisionChildren,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => write!(f, "Validate"),
            Stage::CreateParent => write!(f, "CreateParent"),
            Stage::ProvisionChildren => write!(f, "ProvisionChildren"),
        }
    }
}

/// Why and where a run stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFailure {
    pub stage: Stage,
    /// Index of the failing draft in the caller's list (ProvisionChildren only)
    pub child_index: Option<usize>,
    pub reason: ProvisioningError,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.child_index {
            Some(i) => write!(f, "{} failed at material[{}]: {}", self.stage, i, self.reason),
            None => write!(f, "{} failed: {}", self.stage, self.reason),
        }
    }
}

/// Identifier whose store lookup failed and was let through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedIdentifier {
    pub index: usize,
    pub identifier: String,
    pub reason: String,
}

/// Outcome of one provisioning run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    /// Id the unit was requested under
    pub unit_id: String,
    /// Unit as returned by the store, once created
    pub unit: Option<Unit>,
    /// Materials registered before the run ended
    pub created_child_count: usize,
    pub materials: Vec<Material>,
    /// Identifiers whose uniqueness is best-effort only
    pub unverified: Vec<UnverifiedIdentifier>,
    pub failure: Option<PipelineFailure>,
}

impl PipelineResult {
    fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            unit: None,
            created_child_count: 0,
            materials: Vec::new(),
            unverified: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Unit exists but not all materials were registered
    pub fn is_partial(&self) -> bool {
        self.unit.is_some() && self.failure.is_some()
    }
}

/// Progress notifications for a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProvisioningEvent {
    Validated { unit_id: String, materials: usize },
    UnitCreated { unit_id: String },
    MaterialUploaded { index: usize, identifier: String },
    MaterialCreated { index: usize, identifier: String },
    Failed { stage: Stage, child_index: Option<usize> },
    Completed { unit_id: String, created: usize },
}

/// A draft that passed validation
#[derive(Debug)]
struct ValidMaterial {
    index: usize,
    identifier: String,
    skill: SkillCategory,
    file: SelectedFile,
    script: Option<String>,
    translation: Option<String>,
}

impl ValidMaterial {
    fn into_input(self, file_url: String, unit_id: &str) -> CreateMaterialInput {
        let transcript = self.skill.has_transcript();
        CreateMaterialInput {
            id: self.identifier,
            file_url,
            material_type: self.skill.material_type().to_string(),
            script: self.script.filter(|_| transcript),
            translation: self.translation.filter(|_| transcript),
            unit_id: unit_id.to_string(),
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Provisions a unit and its materials through a [`ContentStore`]
///
/// # Example
///
/// ```rust,ignore
/// use lamad_curriculum::{ProvisioningPipeline, PipelineConfig, UnitDraft};
///
/// let pipeline = ProvisioningPipeline::new(PipelineConfig::default(), store);
/// let result = pipeline.run(UnitDraft::new("Greetings", "chapter-1"), drafts).await;
///
/// if let Some(failure) = &result.failure {
///     println!("{} ({} materials created)", failure, result.created_child_count);
/// }
/// ```
pub struct ProvisioningPipeline<S: ContentStore> {
    config: PipelineConfig,
    store: Arc<S>,
    events_tx: broadcast::Sender<ProvisioningEvent>,
}

impl<S: ContentStore> ProvisioningPipeline<S> {
    pub fn new(config: PipelineConfig, store: Arc<S>) -> Self {
        let (events_tx, _) = broadcast::channel(64);
        Self {
            config,
            store,
            events_tx,
        }
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningEvent> {
        self.events_tx.subscribe()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline for one unit
    ///
    /// Drafts without both a skill and a file are skipped. A repeated run
    /// for the same unit must reuse the draft's id.
    pub async fn run(&self, parent: UnitDraft, drafts: Vec<MaterialDraft>) -> PipelineResult {
        let mut result = PipelineResult::new(parent.id.clone());

        info!(
            unit_id = %parent.id,
            drafts = drafts.len(),
            "Starting unit provisioning"
        );

        // 1. Validate everything before any write
        let materials = match self.validate_all(drafts, &mut result).await {
            Ok(materials) => materials,
            Err(errors) => {
                warn!(unit_id = %parent.id, errors = errors.len(), "Material validation failed");
                return self.fail(result, Stage::Validate, None, ProvisioningError::Validation(errors));
            }
        };

        self.emit(ProvisioningEvent::Validated {
            unit_id: parent.id.clone(),
            materials: materials.len(),
        });

        // 2. Create the unit
        let unit = match self.store.create_unit(&parent).await {
            Ok(unit) => unit,
            Err(e) => {
                error!(unit_id = %parent.id, error = %e, "Unit creation failed");
                return self.fail(result, Stage::CreateParent, None, ProvisioningError::ParentCreation(e));
            }
        };
        info!(unit_id = %unit.id, "Unit created");
        self.emit(ProvisioningEvent::UnitCreated {
            unit_id: unit.id.clone(),
        });
        let unit_id = unit.id.clone();
        result.unit = Some(unit);

        // 3. Give the store time to make the unit visible to material writes
        if !materials.is_empty() && self.config.settle_delay_ms > 0 {
            debug!(delay_ms = self.config.settle_delay_ms, "Settling before materials");
            tokio::time::sleep(self.config.settle_delay()).await;
        }

        // 4. Upload and register materials, in order
        for material in materials {
            let index = material.index;
            let identifier = material.identifier.clone();

            let file_url = match self.store.upload_material_file(&material.file).await {
                Ok(url) => url,
                Err(e) => {
                    error!(index, identifier = %identifier, error = %e, "Material upload failed");
                    return self.fail(
                        result,
                        Stage::ProvisionChildren,
                        Some(index),
                        ProvisioningError::ChildProvisioning { step: ChildStep::Upload, source: e },
                    );
                }
            };
            self.emit(ProvisioningEvent::MaterialUploaded {
                index,
                identifier: identifier.clone(),
            });

            let input = material.into_input(file_url, &unit_id);
            match self.store.create_material(input).await {
                Ok(record) => {
                    debug!(index, identifier = %identifier, "Material created");
                    result.created_child_count += 1;
                    result.materials.push(record);
                    self.emit(ProvisioningEvent::MaterialCreated { index, identifier });
                }
                Err(e) => {
                    error!(index, identifier = %identifier, error = %e, "Material registration failed");
                    return self.fail(
                        result,
                        Stage::ProvisionChildren,
                        Some(index),
                        ProvisioningError::ChildProvisioning { step: ChildStep::Register, source: e },
                    );
                }
            }
        }

        info!(
            unit_id = %unit_id,
            created = result.created_child_count,
            "Unit provisioning completed"
        );
        self.emit(ProvisioningEvent::Completed {
            unit_id,
            created: result.created_child_count,
        });

        result
    }

    /// Validate drafts in two passes
    ///
    /// The first pass is local only (file, grammar, duplicates within the
    /// run). The store lookup pass runs only when every filled draft passed
    /// the first one.
    async fn validate_all(
        &self,
        drafts: Vec<MaterialDraft>,
        result: &mut PipelineResult,
    ) -> Result<Vec<ValidMaterial>, Vec<DraftError>> {
        let mut errors = Vec::new();
        let mut staged = HashSet::new();
        let mut candidates = Vec::new();

        for (index, draft) in drafts.into_iter().enumerate() {
            let MaterialDraft {
                skill_category,
                selected_file,
                script,
                translation,
            } = draft;
            let (Some(skill), Some(file)) = (skill_category, selected_file) else {
                debug!(index, "Skipping unfilled material slot");
                continue;
            };

            let checked = validate_file(&file, self.config.max_file_bytes).and_then(|_| {
                let identifier = derive_identifier(&file.name);
                validate_format(&identifier)?;
                check_pending(&identifier, &staged)?;
                Ok(identifier)
            });

            match checked {
                Ok(identifier) => {
                    staged.insert(identifier.clone());
                    candidates.push(ValidMaterial {
                        index,
                        identifier,
                        skill,
                        file,
                        script,
                        translation,
                    });
                }
                Err(error) => errors.push(DraftError {
                    index: Some(index),
                    error,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        if candidates.is_empty() && self.config.require_materials {
            return Err(vec![DraftError {
                index: None,
                error: ValidationError::NoMaterials,
            }]);
        }

        let mut pending = HashSet::new();
        for candidate in &candidates {
            match check_uniqueness(&candidate.identifier, &pending, self.store.as_ref()).await {
                Ok(Uniqueness::Unique) => {}
                Ok(Uniqueness::Unverified(reason)) => {
                    result.unverified.push(UnverifiedIdentifier {
                        index: candidate.index,
                        identifier: candidate.identifier.clone(),
                        reason,
                    });
                }
                Err(error) => errors.push(DraftError {
                    index: Some(candidate.index),
                    error,
                }),
            }
            pending.insert(candidate.identifier.clone());
        }

        if errors.is_empty() {
            Ok(candidates)
        } else {
            Err(errors)
        }
    }

    fn fail(
        &self,
        mut result: PipelineResult,
        stage: Stage,
        child_index: Option<usize>,
        reason: ProvisioningError,
    ) -> PipelineResult {
        self.emit(ProvisioningEvent::Failed { stage, child_index });
        result.failure = Some(PipelineFailure {
            stage,
            child_index,
            reason,
        });
        result
    }

    fn emit(&self, event: ProvisioningEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn valid(skill: SkillCategory) -> ValidMaterial {
        ValidMaterial {
            index: 0,
            identifier: "JPD113__CHAPTER_01__UNIT_01__LISTENING__JA_VI__0001".into(),
            skill,
            file: SelectedFile::new("a.mp3", vec![1]),
            script: Some("こんにちは".into()),
            translation: Some("Xin chào".into()),
        }
    }

    #[test]
    fn test_transcript_sent_for_listening_only() {
        let listening = valid(SkillCategory::Listening).into_input("url".into(), "u1");
        assert_eq!(listening.material_type, "LISTENING");
        assert_eq!(listening.script.as_deref(), Some("こんにちは"));
        assert_eq!(listening.translation.as_deref(), Some("Xin chào"));
        assert_eq!(listening.unit_id, "u1");

        let reading = valid(SkillCategory::Reading).into_input("url".into(), "u1");
        assert_eq!(reading.material_type, "READING");
        assert!(reading.script.is_none());
        assert!(reading.translation.is_none());
    }

    #[test]
    fn test_failure_display() {
        let failure = PipelineFailure {
            stage: Stage::ProvisionChildren,
            child_index: Some(1),
            reason: ProvisioningError::ChildProvisioning {
                step: ChildStep::Upload,
                source: StoreError::Transport("timed out".into()),
            },
        };
        assert_eq!(
            failure.to_string(),
            "ProvisionChildren failed at material[1]: Material upload failed: Transport error: timed out"
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(ProvisioningEvent::Failed {
            stage: Stage::CreateParent,
            child_index: None,
        })
        .unwrap();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["stage"], "CreateParent");
    }
}
