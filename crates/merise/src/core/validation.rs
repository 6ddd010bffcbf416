//! Edit validation
//!
//! Errors block a commit outright. Warnings block it until the user confirms.

use std::collections::HashSet;

use super::{Attribute, NodeKind, ValidationError, ValidationWarning};

/// Check an entity draft
///
/// Empty name and duplicate attribute names are errors; a missing primary
/// key is a warning.
pub fn validate_entity(
    name: &str,
    attributes: &[Attribute],
) -> Result<Vec<ValidationWarning>, ValidationError> {
    check_name(NodeKind::Entity, name)?;
    check_duplicates(attributes)?;

    let mut warnings = Vec::new();
    if !attributes.iter().any(|a| a.is_pk) {
        warnings.push(ValidationWarning::MissingPrimaryKey);
    }
    Ok(warnings)
}

/// Check an association draft; only the name is constrained
pub fn validate_association(
    name: &str,
    _attributes: &[Attribute],
) -> Result<Vec<ValidationWarning>, ValidationError> {
    check_name(NodeKind::Association, name)?;
    Ok(Vec::new())
}

fn check_name(kind: NodeKind, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName {
            kind: kind.to_string(),
        });
    }
    Ok(())
}

/// Case-insensitive duplicate names, each reported once in the order its
/// first repeat appears
fn check_duplicates(attributes: &[Attribute]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    let mut names: Vec<String> = Vec::new();
    for attr in attributes {
        let lower = attr.name.to_lowercase();
        if !seen.insert(lower.clone()) && !names.contains(&lower) {
            names.push(lower);
        }
    }
    if names.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DuplicateAttributes { names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(names: &[&str]) -> Vec<Attribute> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Attribute::new(format!("attr_{}", i), *n))
            .collect()
    }

    #[test]
    fn test_empty_name_is_an_error() {
        let err = validate_entity("   ", &[Attribute::primary_key("k")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyName { kind: "entity".to_string() });
        assert!(validate_association("", &[]).is_err());
    }

    #[test]
    fn test_duplicates_are_case_insensitive() {
        let err = validate_entity("Client", &attrs(&["Code", "nom", "code", "NOM", "CODE"])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateAttributes {
                names: vec!["code".to_string(), "nom".to_string()]
            }
        );
    }

    #[test]
    fn test_missing_primary_key_is_a_warning() {
        let warnings = validate_entity("Client", &attrs(&["nom"])).unwrap();
        assert_eq!(warnings, vec![ValidationWarning::MissingPrimaryKey]);

        let mut with_key = attrs(&["nom"]);
        with_key.push(Attribute::primary_key("k"));
        assert!(validate_entity("Client", &with_key).unwrap().is_empty());
    }

    #[test]
    fn test_association_allows_duplicates_and_no_key() {
        assert!(validate_association("Acheter", &attrs(&["date", "Date"])).unwrap().is_empty());
    }
}
