//! In-memory cloud assembly: templates, asset manifests and the manifest
//! that ties them together. Writing to disk is left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{Packaging, StagedAsset};
use crate::construct::{App, ConstructTree, NodeId};
use crate::template::Template;

pub const CLOUD_ASSEMBLY_VERSION: &str = "36.0.0";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const TREE_FILE: &str = "tree.json";
pub const TREE_ARTIFACT_ID: &str = "Tree";
pub const CURRENT_ENVIRONMENT_DESTINATION: &str = "current_account-current_region";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactType {
    #[serde(rename = "aws:cloudformation:stack")]
    CloudFormationStack,
    #[serde(rename = "cdk:asset-manifest")]
    AssetManifest,
    #[serde(rename = "cdk:tree")]
    Tree,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub properties: ArtifactProperties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub version: String,
    pub artifacts: BTreeMap<String, Artifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSource {
    pub path: String,
    pub packaging: Packaging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDestination {
    pub bucket_name: String,
    pub object_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAsset {
    pub source: FileSource,
    pub destinations: BTreeMap<String, FileDestination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub version: String,
    pub files: BTreeMap<String, FileAsset>,
}

impl AssetManifest {
    pub fn from_assets<'a>(
        assets: impl IntoIterator<Item = &'a StagedAsset>,
        bucket_name: &str,
    ) -> Self {
        let files = assets
            .into_iter()
            .map(|asset| {
                let destination = FileDestination {
                    bucket_name: bucket_name.to_string(),
                    object_key: asset.object_key(),
                };
                let file = FileAsset {
                    source: FileSource {
                        path: asset.staged_file.clone(),
                        packaging: asset.packaging,
                    },
                    destinations: BTreeMap::from([(
                        CURRENT_ENVIRONMENT_DESTINATION.to_string(),
                        destination,
                    )]),
                };
                (asset.fingerprint.clone(), file)
            })
            .collect();

        Self {
            version: CLOUD_ASSEMBLY_VERSION.to_string(),
            files,
        }
    }
}

/// Everything synthesized for one stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackArtifact {
    pub stack_id: String,
    pub environment: String,
    pub template: Template,
    pub asset_manifest: AssetManifest,
    pub assets: Vec<StagedAsset>,
}

impl StackArtifact {
    pub fn template_file(&self) -> String {
        format!("{}.template.json", self.stack_id)
    }

    pub fn asset_manifest_id(&self) -> String {
        format!("{}.assets", self.stack_id)
    }

    pub fn asset_manifest_file(&self) -> String {
        format!("{}.assets.json", self.stack_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub path: String,
    #[serde(rename = "type")]
    pub construct_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    pub fn from_app(app: &App) -> Self {
        let tree = app.tree();
        let mut root = Self::from_node(tree, tree.root());
        root.id = "App".to_string();
        root
    }

    fn from_node(tree: &ConstructTree, id: NodeId) -> Self {
        let node = tree.node(id);
        let children = tree
            .children(id)
            .map(|(child_id, child)| (child.id.clone(), Self::from_node(tree, child_id)))
            .collect();
        Self {
            id: node.id.clone(),
            path: tree.path(id),
            construct_type: node.kind.type_name().to_string(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloudAssembly {
    pub manifest: AssemblyManifest,
    pub stacks: Vec<StackArtifact>,
    pub tree: TreeNode,
}

impl CloudAssembly {
    pub fn new(stacks: Vec<StackArtifact>, tree: TreeNode) -> Self {
        let mut artifacts = BTreeMap::new();
        for stack in &stacks {
            artifacts.insert(
                stack.asset_manifest_id(),
                Artifact {
                    artifact_type: ArtifactType::AssetManifest,
                    environment: None,
                    properties: ArtifactProperties {
                        template_file: None,
                        file: Some(stack.asset_manifest_file()),
                    },
                    dependencies: Vec::new(),
                },
            );
            artifacts.insert(
                stack.stack_id.clone(),
                Artifact {
                    artifact_type: ArtifactType::CloudFormationStack,
                    environment: Some(stack.environment.clone()),
                    properties: ArtifactProperties {
                        template_file: Some(stack.template_file()),
                        file: None,
                    },
                    dependencies: vec![stack.asset_manifest_id()],
                },
            );
        }
        artifacts.insert(
            TREE_ARTIFACT_ID.to_string(),
            Artifact {
                artifact_type: ArtifactType::Tree,
                environment: None,
                properties: ArtifactProperties {
                    template_file: None,
                    file: Some(TREE_FILE.to_string()),
                },
                dependencies: Vec::new(),
            },
        );

        Self {
            manifest: AssemblyManifest {
                version: CLOUD_ASSEMBLY_VERSION.to_string(),
                artifacts,
            },
            stacks,
            tree,
        }
    }

    pub fn stack(&self, stack_id: &str) -> Option<&StackArtifact> {
        self.stacks.iter().find(|stack| stack.stack_id == stack_id)
    }
}
