//! Content store collaborator traits
//!
//! The pipeline and the validator only talk to the store through these
//! traits, so tests can swap in an in-memory store.

use crate::error::Result;
use crate::types::{CreateMaterialInput, Material, SelectedFile, Unit, UnitDraft};
use async_trait::async_trait;

/// Existence lookup for materials
#[async_trait]
pub trait MaterialLookup: Send + Sync {
    /// Fetch a material by id, `StoreError::NotFound` when absent
    async fn lookup_material(&self, id: &str) -> Result<Material>;
}

/// Operations the provisioning pipeline drives
#[async_trait]
pub trait ContentStore: MaterialLookup {
    /// Create (or update, for a repeated id) a unit
    async fn create_unit(&self, draft: &UnitDraft) -> Result<Unit>;

    /// Upload a material file and return the stored file reference
    async fn upload_material_file(&self, file: &SelectedFile) -> Result<String>;

    /// Register a material against an existing unit
    async fn create_material(&self, input: CreateMaterialInput) -> Result<Material>;
}
