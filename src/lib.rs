//! Lamad Curriculum - authoring core for courses, chapters and units
//!
//! # Architecture
//!
//! ```text
//! prerequisite   order chapters/units by their prerequisite sibling
//! identifier     derive + validate material ids from file names
//! pipeline       create unit → settle → upload + register each material
//!    │
//!    ▼
//! ContentStore   trait; StorageClient is the HTTP implementation
//! ```
//!
//! The presentation layer hands in drafts and renders the
//! [`PipelineResult`]; nothing here keeps state between runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use lamad_curriculum::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(StorageClient::new(StorageConfig::default())?);
//! let pipeline = ProvisioningPipeline::new(PipelineConfig::default(), store);
//!
//! let unit = UnitDraft::new("Greetings", "chapter-1");
//! let drafts = vec![MaterialDraft::new(
//!     SkillCategory::Kanji,
//!     SelectedFile::new("JPD113__CHAPTER_01__UNIT_01__KANJI__JA_VI__0001.pdf", bytes),
//! )];
//!
//! let result = pipeline.run(unit, drafts).await;
//! ```

// Error types
pub mod error;

// Configuration
pub mod config;

// Curriculum data model
pub mod types;

// Skill lookup table
pub mod skill;

// Prerequisite ordering
pub mod prerequisite;

// Material identifier validation
pub mod identifier;

// Content store traits
pub mod store;

// HTTP content store client
#[cfg(feature = "client")]
pub mod client;

// Provisioning pipeline
pub mod pipeline;

pub use config::{Config, PipelineConfig, StorageConfig};
pub use error::{
    ChildStep, ConfigError, DraftError, DuplicateOrigin, ProvisioningError, Result, StoreError,
    ValidationError,
};
pub use identifier::{
    check_uniqueness, derive_identifier, validate_file, validate_format, MaterialIdentifier,
    Uniqueness,
};
pub use pipeline::{
    PipelineFailure, PipelineResult, ProvisioningEvent, ProvisioningPipeline, Stage,
    UnverifiedIdentifier,
};
pub use prerequisite::{sort_by_prerequisite, unresolved_prerequisites, Prerequisite};
pub use skill::{SkillCategory, SkillProfile};
pub use store::{ContentStore, MaterialLookup};
pub use types::*;

#[cfg(feature = "client")]
pub use client::StorageClient;
