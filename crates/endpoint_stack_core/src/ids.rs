use sha2::{Digest, Sha256};

use crate::assembly::TREE_ARTIFACT_ID;
use crate::error::SynthError;

pub const PATH_SEPARATOR: char = '/';
pub const MAX_STACK_ID_LENGTH: usize = 128;
const MAX_LOGICAL_ID_LENGTH: usize = 255;
const HASH_LENGTH: usize = 8;

pub fn validate_construct_id(id: &str) -> Result<(), SynthError> {
    if id.trim().is_empty() {
        return Err(SynthError::invalid_id(id, "construct ids cannot be empty"));
    }
    if id.contains(PATH_SEPARATOR) {
        return Err(SynthError::invalid_id(
            id,
            format!("construct ids cannot contain '{PATH_SEPARATOR}'"),
        ));
    }
    Ok(())
}

/// Stack ids double as CloudFormation stack names.
pub fn validate_stack_id(id: &str) -> Result<(), SynthError> {
    validate_construct_id(id)?;

    if id.len() > MAX_STACK_ID_LENGTH {
        return Err(SynthError::invalid_id(
            id,
            format!("stack ids cannot exceed {MAX_STACK_ID_LENGTH} characters"),
        ));
    }

    // Stack ids share the manifest artifact namespace with the tree artifact.
    if id == TREE_ARTIFACT_ID {
        return Err(SynthError::invalid_id(
            id,
            format!("'{TREE_ARTIFACT_ID}' is reserved for the construct tree artifact"),
        ));
    }

    let mut chars = id.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(SynthError::invalid_id(
            id,
            "stack ids must start with a letter and contain only letters, digits and '-'",
        ));
    }
    Ok(())
}

/// Derives a template logical id from a construct path relative to its stack.
///
/// Top-level constructs keep their (sanitized) id. Nested paths get a
/// readable prefix plus a short hash of the full path so that distinct
/// paths never collide after sanitization.
pub fn logical_id(components: &[&str]) -> String {
    if components.len() == 1 {
        return sanitize(components[0]);
    }

    let human: String = human_components(components)
        .iter()
        .map(|component| sanitize(component))
        .collect();
    let max_human = MAX_LOGICAL_ID_LENGTH - HASH_LENGTH;
    let human = if human.len() > max_human {
        human[human.len() - max_human..].to_string()
    } else {
        human
    };

    format!("{human}{}", path_hash(components))
}

fn human_components<'a>(components: &[&'a str]) -> Vec<&'a str> {
    let mut kept: Vec<&str> = components
        .iter()
        .copied()
        .filter(|component| *component != "Default")
        .collect();
    if kept.len() > 1 && kept.last() == Some(&"Resource") {
        kept.pop();
    }
    kept
}

fn path_hash(components: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(components.join("/"));
    let digest = format!("{:X}", hasher.finalize());
    digest[..HASH_LENGTH].to_string()
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_logical_id_is_the_sanitized_id() {
        assert_eq!(logical_id(&["TransactionHandler"]), "TransactionHandler");
        assert_eq!(logical_id(&["my-api_v2"]), "myapiv2");
    }

    #[test]
    fn nested_logical_id_drops_resource_and_default() {
        let id = logical_id(&["TransactionHandler", "ServiceRole", "Resource"]);
        assert!(id.starts_with("TransactionHandlerServiceRole"));
        let prefix = "TransactionHandlerServiceRole";
        assert_eq!(id.len(), prefix.len() + HASH_LENGTH);

        let method = logical_id(&["Endpoint", "Default", "ANY"]);
        assert!(method.starts_with("EndpointANY"));
    }

    #[test]
    fn paths_that_sanitize_alike_get_distinct_hashes() {
        let a = logical_id(&["Api", "{proxy+}"]);
        let b = logical_id(&["Api", "proxy"]);
        assert_ne!(a, b);
    }

    #[test]
    fn logical_id_is_stable() {
        let path = ["Endpoint", "Deployment"];
        assert_eq!(logical_id(&path), logical_id(&path));
    }

    #[test]
    fn rejects_separator_in_construct_id() {
        assert!(validate_construct_id("a/b").is_err());
        assert!(validate_construct_id("").is_err());
        assert!(validate_construct_id("Endpoint").is_ok());
    }

    #[test]
    fn stack_ids_follow_cloudformation_naming() {
        assert!(validate_stack_id("TransactionParserCdkAppStack").is_ok());
        assert!(validate_stack_id("stack-1").is_ok());
        assert!(validate_stack_id("1stack").is_err());
        assert!(validate_stack_id("my_stack").is_err());
        let too_long = "a".repeat(MAX_STACK_ID_LENGTH + 1);
        assert!(validate_stack_id(&too_long).is_err());
    }

    #[test]
    fn tree_artifact_id_is_reserved() {
        let error = validate_stack_id("Tree").expect_err("reserved id");
        assert!(error.to_string().contains("reserved"));
        assert!(validate_stack_id("TreeStack").is_ok());
    }
}
