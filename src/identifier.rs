//! Material identifiers derived from file names
//!
//! Authors never type a material id. It is taken from the uploaded file's
//! name and must follow the course naming grammar, e.g.
//! `JPD113__CHAPTER_01__UNIT_01__KANJI__JA_VI__0001.pdf`.
//!
//! The uniqueness check against the store is advisory only: the store
//! rejects duplicate ids authoritatively when the record is created.

use crate::error::{DuplicateOrigin, StoreError, ValidationError};
use crate::skill::SkillCategory;
use crate::store::MaterialLookup;
use crate::types::SelectedFile;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Template shown to authors when an identifier is rejected
pub const IDENTIFIER_TEMPLATE: &str =
    "<COURSE_CODE>__CHAPTER_<digits>__UNIT_<digits>__<SKILL>__JA_VI__<digits>";

/// Default upload limit (5 MiB)
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 2] = ["pdf", "mp3"];
const ALLOWED_MIME_TYPES: [&str; 3] = ["application/pdf", "audio/mpeg", "audio/mp3"];

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([A-Z0-9]+)__CHAPTER_([0-9]+)__UNIT_([0-9]+)__([A-Z0-9]+)__JA_VI__([0-9]+)$",
        )
        .expect("identifier pattern is valid")
    })
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Parsed segments of a valid identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialIdentifier {
    pub raw: String,
    pub course_code: String,
    pub chapter: String,
    pub unit: String,
    pub skill_token: String,
    pub sequence: String,
}

impl MaterialIdentifier {
    /// Skill named by the identifier, if it is one of the known categories
    pub fn skill(&self) -> Option<SkillCategory> {
        SkillCategory::from_token(&self.skill_token)
    }
}

/// Outcome of the advisory uniqueness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uniqueness {
    /// Store confirmed no record with this id
    Unique,
    /// Lookup failed for another reason; allowed, but not verified
    Unverified(String),
}

/// Derive an identifier from a file name
///
/// Strips the last extension and collapses whitespace runs to `_`.
/// Case is left as the author typed it.
pub fn derive_identifier(filename: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(pos) if pos > 0 => &filename[..pos],
        _ => filename,
    };
    whitespace_regex().replace_all(stem, "_").into_owned()
}

/// Check an identifier against the naming grammar
pub fn validate_format(identifier: &str) -> Result<MaterialIdentifier, ValidationError> {
    let caps = identifier_regex()
        .captures(identifier)
        .ok_or_else(|| ValidationError::InvalidFormat {
            identifier: identifier.to_string(),
            expected: IDENTIFIER_TEMPLATE,
        })?;

    Ok(MaterialIdentifier {
        raw: identifier.to_string(),
        course_code: caps[1].to_string(),
        chapter: caps[2].to_string(),
        unit: caps[3].to_string(),
        skill_token: caps[4].to_string(),
        sequence: caps[5].to_string(),
    })
}

/// Check the selected file's type and size
pub fn validate_file(file: &SelectedFile, max_bytes: u64) -> Result<(), ValidationError> {
    let extension_ok = file
        .extension()
        .map_or(false, |ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    let mime_ok = file
        .mime_type
        .as_deref()
        .map_or(false, |mime| ALLOWED_MIME_TYPES.contains(&mime));

    if !extension_ok && !mime_ok {
        return Err(ValidationError::UnsupportedFileType {
            name: file.name.clone(),
        });
    }

    if file.size > max_bytes {
        return Err(ValidationError::FileTooLarge {
            name: file.name.clone(),
            size: file.size,
            limit: max_bytes,
        });
    }

    Ok(())
}

/// Reject an identifier already staged in this run
pub fn check_pending(identifier: &str, pending: &HashSet<String>) -> Result<(), ValidationError> {
    if pending.contains(identifier) {
        return Err(ValidationError::DuplicateIdentifier {
            identifier: identifier.to_string(),
            origin: DuplicateOrigin::Pending,
        });
    }
    Ok(())
}

/// Reject identifiers already staged in this run or present in the store
///
/// Only a NotFound from the store counts as verified unique. Any other
/// lookup failure lets the identifier through as [`Uniqueness::Unverified`].
pub async fn check_uniqueness<L: MaterialLookup + ?Sized>(
    identifier: &str,
    pending: &HashSet<String>,
    lookup: &L,
) -> Result<Uniqueness, ValidationError> {
    check_pending(identifier, pending)?;

    match lookup.lookup_material(identifier).await {
        Ok(_) => Err(ValidationError::DuplicateIdentifier {
            identifier: identifier.to_string(),
            origin: DuplicateOrigin::Store,
        }),
        Err(StoreError::NotFound(_)) => Ok(Uniqueness::Unique),
        Err(e) => {
            tracing::warn!(
                identifier = %identifier,
                error = %e,
                "Material lookup failed, uniqueness not verified"
            );
            Ok(Uniqueness::Unverified(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as StoreResult;
    use crate::types::Material;
    use async_trait::async_trait;

    const VALID: &str = "JPD113__CHAPTER_01__UNIT_01__KANJI__JA_VI__0001";

    struct FixedLookup(StoreResult<Material>);

    #[async_trait]
    impl MaterialLookup for FixedLookup {
        async fn lookup_material(&self, _id: &str) -> StoreResult<Material> {
            self.0.clone()
        }
    }

    fn existing(id: &str) -> Material {
        Material {
            id: id.to_string(),
            file_url: "sha256-00".into(),
            material_type: "KANJI".into(),
            script: None,
            translation: None,
            unit_id: "u1".into(),
        }
    }

    #[test]
    fn test_derive_identifier() {
        assert_eq!(derive_identifier(&format!("{}.pdf", VALID)), VALID);
        assert_eq!(derive_identifier("my  lesson\tone.mp3"), "my_lesson_one");
        assert_eq!(derive_identifier("archive.tar.gz"), "archive.tar");
        assert_eq!(derive_identifier("no_extension"), "no_extension");
        assert_eq!(derive_identifier(".hidden"), ".hidden");
        assert_eq!(derive_identifier("Mixed Case.pdf"), "Mixed_Case");
    }

    #[test]
    fn test_valid_identifier_parses() {
        let parsed = validate_format(VALID).unwrap();
        assert_eq!(parsed.course_code, "JPD113");
        assert_eq!(parsed.chapter, "01");
        assert_eq!(parsed.unit, "01");
        assert_eq!(parsed.skill_token, "KANJI");
        assert_eq!(parsed.sequence, "0001");
        assert_eq!(parsed.skill(), Some(SkillCategory::Kanji));
    }

    #[test]
    fn test_invalid_identifiers_rejected() {
        let bad = [
            "jpd113__chapter_01__unit_01__kanji__ja_vi__0001",
            "JPD113_CHAPTER_01__UNIT_01__KANJI__JA_VI__0001",
            "JPD113__CHAPTER_01__UNIT_01__KANJI__JA_VI__",
            "JPD113__CHAPTER_01__KANJI__JA_VI__0001",
            "JPD113__CHAPTER_01__UNIT_01__KANJI__JA_VI__0001__EXTRA",
            "JPD113__CHAPTER_1A__UNIT_01__KANJI__JA_VI__0001",
            "",
        ];
        for id in bad {
            match validate_format(id) {
                Err(ValidationError::InvalidFormat { expected, .. }) => {
                    assert_eq!(expected, IDENTIFIER_TEMPLATE)
                }
                other => panic!("{:?} should be rejected, got {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_file_constraints() {
        assert!(validate_file(&SelectedFile::new("a.pdf", vec![0; 10]), MAX_FILE_BYTES).is_ok());
        assert!(validate_file(&SelectedFile::new("a.MP3", vec![0; 10]), MAX_FILE_BYTES).is_ok());
        assert!(validate_file(
            &SelectedFile::new("audio", vec![]).with_mime_type("audio/mpeg"),
            MAX_FILE_BYTES
        )
        .is_ok());

        assert!(matches!(
            validate_file(&SelectedFile::new("a.docx", vec![]), MAX_FILE_BYTES),
            Err(ValidationError::UnsupportedFileType { .. })
        ));

        let mut big = SelectedFile::new("big.pdf", vec![]);
        big.size = MAX_FILE_BYTES + 1;
        assert!(matches!(
            validate_file(&big, MAX_FILE_BYTES),
            Err(ValidationError::FileTooLarge { size, .. }) if size == MAX_FILE_BYTES + 1
        ));

        let mut exact = SelectedFile::new("exact.pdf", vec![]);
        exact.size = MAX_FILE_BYTES;
        assert!(validate_file(&exact, MAX_FILE_BYTES).is_ok());
    }

    #[tokio::test]
    async fn test_pending_duplicate() {
        let lookup = FixedLookup(Err(StoreError::NotFound(VALID.into())));
        let mut pending = HashSet::new();

        assert_eq!(
            check_uniqueness(VALID, &pending, &lookup).await.unwrap(),
            Uniqueness::Unique
        );

        pending.insert(VALID.to_string());
        assert_eq!(
            check_uniqueness(VALID, &pending, &lookup).await,
            Err(ValidationError::DuplicateIdentifier {
                identifier: VALID.into(),
                origin: DuplicateOrigin::Pending,
            })
        );
    }

    #[tokio::test]
    async fn test_store_duplicate() {
        let lookup = FixedLookup(Ok(existing(VALID)));
        let result = check_uniqueness(VALID, &HashSet::new(), &lookup).await;
        assert!(matches!(
            result,
            Err(ValidationError::DuplicateIdentifier { origin: DuplicateOrigin::Store, .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unverified() {
        let lookup = FixedLookup(Err(StoreError::Transport("connection refused".into())));
        let result = check_uniqueness(VALID, &HashSet::new(), &lookup).await.unwrap();
        assert!(matches!(result, Uniqueness::Unverified(reason) if reason.contains("connection refused")));
    }
}
