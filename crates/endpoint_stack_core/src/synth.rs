//! Synthesis: expands the construct tree into CloudFormation resources.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::asset::{AssetResolver, StagedAsset};
use crate::assembly::{AssetManifest, CloudAssembly, StackArtifact, TreeNode};
use crate::config::{FunctionProps, RestApiProps, StackProps};
use crate::construct::{App, ConstructKind, ConstructTree, NodeId};
use crate::error::SynthError;
use crate::ids::logical_id;
use crate::template::{
    get_att, join, reference, sub, tags, Output, Resource, Template, AWS_ACCOUNT_ID,
    AWS_PARTITION, AWS_REGION, AWS_URL_SUFFIX,
};

pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";
pub const LAMBDA_PERMISSION: &str = "AWS::Lambda::Permission";
pub const REST_API: &str = "AWS::ApiGateway::RestApi";
pub const API_RESOURCE: &str = "AWS::ApiGateway::Resource";
pub const API_METHOD: &str = "AWS::ApiGateway::Method";
pub const API_DEPLOYMENT: &str = "AWS::ApiGateway::Deployment";
pub const API_STAGE: &str = "AWS::ApiGateway::Stage";

const PROXY_PATH_PART: &str = "{proxy+}";
const BASIC_EXECUTION_POLICY: &str = ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
const TEST_INVOKE_STAGE: &str = "test-invoke-stage";

/// Synthesizes every stack registered in `app`.
pub fn synthesize(app: &App, resolver: &dyn AssetResolver) -> Result<CloudAssembly, SynthError> {
    let mut stacks = Vec::new();
    for (stack_id, _) in app.stacks() {
        stacks.push(synthesize_stack(app, stack_id, resolver)?);
    }
    Ok(CloudAssembly::new(stacks, TreeNode::from_app(app)))
}

pub fn synthesize_stack(
    app: &App,
    stack: NodeId,
    resolver: &dyn AssetResolver,
) -> Result<StackArtifact, SynthError> {
    let tree = app.tree();
    let stack_node = tree.node(stack);
    let ConstructKind::Stack(stack_props) = &stack_node.kind else {
        return Err(SynthError::UnexpectedConstruct(tree.path(stack)));
    };

    let mut template = Template {
        description: stack_props.description.clone(),
        ..Template::default()
    };
    let mut assets: Vec<StagedAsset> = Vec::new();

    for node_id in tree.descendants(stack) {
        match &tree.node(node_id).kind {
            ConstructKind::Function(props) => {
                let asset = resolver.resolve(&props.code)?;
                debug!(
                    construct = %tree.path(node_id),
                    fingerprint = %asset.fingerprint,
                    "resolved code asset"
                );
                render_function(&mut template, tree, node_id, props, stack_props, &asset);
                if !assets
                    .iter()
                    .any(|known| known.fingerprint == asset.fingerprint)
                {
                    assets.push(asset);
                }
            }
            ConstructKind::LambdaRestApi { props, target } => {
                render_rest_api(&mut template, tree, node_id, *target, props, stack_props);
            }
            ConstructKind::App | ConstructKind::Stack(_) => {
                return Err(SynthError::UnexpectedConstruct(tree.path(node_id)));
            }
        }
    }

    info!(
        stack = %stack_node.id,
        resources = template.resources.len(),
        assets = assets.len(),
        "synthesized stack"
    );

    let asset_manifest = AssetManifest::from_assets(&assets, &stack_props.asset_bucket());
    Ok(StackArtifact {
        stack_id: stack_node.id.clone(),
        environment: stack_props.env.uri(),
        template,
        asset_manifest,
        assets,
    })
}

/// Logical id of the `AWS::Lambda::Function` backing a function construct.
pub fn function_logical_id(tree: &ConstructTree, function: NodeId) -> String {
    child_logical_id(tree, function, &["Resource"])
}

pub fn rest_api_logical_id(tree: &ConstructTree, api: NodeId) -> String {
    child_logical_id(tree, api, &["Resource"])
}

fn child_logical_id(tree: &ConstructTree, node: NodeId, suffix: &[&str]) -> String {
    let mut components = tree.path_in_stack(node);
    components.extend_from_slice(suffix);
    logical_id(&components)
}

fn cdk_path(tree: &ConstructTree, node: NodeId, suffix: &[&str]) -> Value {
    let mut path = tree.path(node);
    for component in suffix {
        path.push('/');
        path.push_str(component);
    }
    json!({ "aws:cdk:path": path })
}

fn render_function(
    template: &mut Template,
    tree: &ConstructTree,
    node: NodeId,
    props: &FunctionProps,
    stack_props: &StackProps,
    asset: &StagedAsset,
) {
    let role_id = child_logical_id(tree, node, &["ServiceRole", "Resource"]);
    let function_id = function_logical_id(tree, node);

    let mut role = Map::new();
    role.insert(
        "AssumeRolePolicyDocument".to_string(),
        json!({
            "Statement": [{
                "Action": "sts:AssumeRole",
                "Effect": "Allow",
                "Principal": { "Service": "lambda.amazonaws.com" }
            }],
            "Version": "2012-10-17"
        }),
    );
    role.insert(
        "ManagedPolicyArns".to_string(),
        json!([join(vec![
            json!("arn:"),
            reference(AWS_PARTITION),
            json!(BASIC_EXECUTION_POLICY),
        ])]),
    );
    if let Some(tags) = tags(&stack_props.tags) {
        role.insert("Tags".to_string(), tags);
    }
    template.insert(
        role_id.clone(),
        Resource::new(IAM_ROLE, Value::Object(role))
            .with_metadata(cdk_path(tree, node, &["ServiceRole", "Resource"])),
    );

    let mut function = json!({
        "Code": {
            "S3Bucket": sub(&stack_props.asset_bucket()),
            "S3Key": asset.object_key(),
        },
        "Handler": props.handler.as_str(),
        "Role": get_att(&role_id, "Arn"),
        "Runtime": props.runtime.as_str(),
    });
    if let Some(memory) = props.memory_size {
        function["MemorySize"] = json!(memory);
    }
    if let Some(timeout) = props.timeout_seconds {
        function["Timeout"] = json!(timeout);
    }
    if !props.environment.is_empty() {
        function["Environment"] = json!({ "Variables": props.environment });
    }
    if let Some(tags) = tags(&stack_props.tags) {
        function["Tags"] = tags;
    }

    let mut metadata = cdk_path(tree, node, &["Resource"]);
    metadata["aws:asset:path"] = json!(asset.staged_file);
    metadata["aws:asset:property"] = json!("Code");

    template.insert(
        function_id,
        Resource::new(LAMBDA_FUNCTION, function)
            .depends_on([role_id])
            .with_metadata(metadata),
    );
}

/// Identifiers of the resources generated for one REST API construct.
struct ApiIds {
    api: String,
    root_method: String,
    proxy_resource: String,
    proxy_method: String,
    deployment: String,
    stage: String,
}

fn render_rest_api(
    template: &mut Template,
    tree: &ConstructTree,
    node: NodeId,
    target: NodeId,
    props: &RestApiProps,
    stack_props: &StackProps,
) {
    let stage_component = format!("DeploymentStage.{}", props.stage_name);
    let ids = ApiIds {
        api: rest_api_logical_id(tree, node),
        root_method: child_logical_id(tree, node, &["Default", "ANY", "Resource"]),
        proxy_resource: child_logical_id(tree, node, &["Default", PROXY_PATH_PART, "Resource"]),
        proxy_method: child_logical_id(
            tree,
            node,
            &["Default", PROXY_PATH_PART, "ANY", "Resource"],
        ),
        deployment: child_logical_id(tree, node, &["Deployment", "Resource"]),
        stage: child_logical_id(tree, node, &[stage_component.as_str(), "Resource"]),
    };
    let function_id = function_logical_id(tree, target);
    let api_name = &tree.node(node).id;

    let mut api = Map::new();
    api.insert("Name".to_string(), json!(api_name));
    if let Some(description) = &props.description {
        api.insert("Description".to_string(), json!(description));
    }
    if let Some(tags) = tags(&stack_props.tags) {
        api.insert("Tags".to_string(), tags);
    }
    template.insert(
        ids.api.clone(),
        Resource::new(REST_API, Value::Object(api))
            .with_metadata(cdk_path(tree, node, &["Resource"])),
    );

    template.insert(
        ids.proxy_resource.clone(),
        Resource::new(
            API_RESOURCE,
            json!({
                "ParentId": get_att(&ids.api, "RootResourceId"),
                "PathPart": PROXY_PATH_PART,
                "RestApiId": reference(&ids.api),
            }),
        )
        .with_metadata(cdk_path(tree, node, &["Default", PROXY_PATH_PART, "Resource"])),
    );

    let integration = json!({
        "IntegrationHttpMethod": "POST",
        "Type": "AWS_PROXY",
        "Uri": join(vec![
            json!("arn:"),
            reference(AWS_PARTITION),
            json!(":apigateway:"),
            reference(AWS_REGION),
            json!(":lambda:path/2015-03-31/functions/"),
            get_att(&function_id, "Arn"),
            json!("/invocations"),
        ]),
    });

    template.insert(
        ids.root_method.clone(),
        Resource::new(
            API_METHOD,
            json!({
                "AuthorizationType": "NONE",
                "HttpMethod": "ANY",
                "Integration": integration.clone(),
                "ResourceId": get_att(&ids.api, "RootResourceId"),
                "RestApiId": reference(&ids.api),
            }),
        )
        .with_metadata(cdk_path(tree, node, &["Default", "ANY", "Resource"])),
    );

    template.insert(
        ids.proxy_method.clone(),
        Resource::new(
            API_METHOD,
            json!({
                "AuthorizationType": "NONE",
                "HttpMethod": "ANY",
                "Integration": integration,
                "ResourceId": reference(&ids.proxy_resource),
                "RestApiId": reference(&ids.api),
            }),
        )
        .with_metadata(cdk_path(tree, node, &["Default", PROXY_PATH_PART, "ANY", "Resource"])),
    );

    let permissions: [(&[&str], Value, &str); 4] = [
        (&["Default", "ANY"], reference(&ids.stage), "/*/"),
        (&["Default", "ANY"], json!(TEST_INVOKE_STAGE), "/*/"),
        (&["Default", PROXY_PATH_PART, "ANY"], reference(&ids.stage), "/*/*"),
        (&["Default", PROXY_PATH_PART, "ANY"], json!(TEST_INVOKE_STAGE), "/*/*"),
    ];
    for (method_path, stage, suffix) in permissions {
        let permission_name = if stage.is_string() {
            "ApiPermission.Test"
        } else {
            "ApiPermission"
        };
        let mut components: Vec<&str> = method_path.to_vec();
        components.push(permission_name);
        let permission_id = child_logical_id(tree, node, &components);

        template.insert(
            permission_id,
            Resource::new(
                LAMBDA_PERMISSION,
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": get_att(&function_id, "Arn"),
                    "Principal": "apigateway.amazonaws.com",
                    "SourceArn": join(vec![
                        json!("arn:"),
                        reference(AWS_PARTITION),
                        json!(":execute-api:"),
                        reference(AWS_REGION),
                        json!(":"),
                        reference(AWS_ACCOUNT_ID),
                        json!(":"),
                        reference(&ids.api),
                        json!("/"),
                        stage,
                        json!(suffix),
                    ]),
                }),
            )
            .with_metadata(cdk_path(tree, node, &components)),
        );
    }

    template.insert(
        ids.deployment.clone(),
        Resource::new(
            API_DEPLOYMENT,
            json!({
                "Description": "Automatically created by the RestApi construct",
                "RestApiId": reference(&ids.api),
            }),
        )
        .depends_on([
            ids.root_method.clone(),
            ids.proxy_method.clone(),
            ids.proxy_resource.clone(),
        ])
        .with_metadata(cdk_path(tree, node, &["Deployment", "Resource"])),
    );

    let mut stage = json!({
        "DeploymentId": reference(&ids.deployment),
        "RestApiId": reference(&ids.api),
        "StageName": props.stage_name,
    });
    if let Some(tags) = tags(&stack_props.tags) {
        stage["Tags"] = tags;
    }
    template.insert(
        ids.stage.clone(),
        Resource::new(API_STAGE, stage)
            .with_metadata(cdk_path(tree, node, &[stage_component.as_str(), "Resource"])),
    );

    template.outputs.insert(
        child_logical_id(tree, node, &["Endpoint"]),
        Output {
            value: join(vec![
                json!("https://"),
                reference(&ids.api),
                json!(".execute-api."),
                reference(AWS_REGION),
                json!("."),
                reference(AWS_URL_SUFFIX),
                json!("/"),
                reference(&ids.stage),
                json!("/"),
            ]),
            description: Some(format!("Invoke URL of {api_name}")),
        },
    );
}

/// Counts constructs of each kind below `stack`, keyed by type name.
pub fn construct_counts(tree: &ConstructTree, stack: NodeId) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for node in tree.descendants(stack) {
        let kind = tree.node(node).kind.type_name();
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}
