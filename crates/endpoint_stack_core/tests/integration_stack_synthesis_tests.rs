mod support;

use endpoint_stack_core::config::{DEFAULT_REGION, DEFAULT_STAGE_NAME, UNKNOWN_ACCOUNT};
use endpoint_stack_core::synth::{
    construct_counts, function_logical_id, rest_api_logical_id, API_DEPLOYMENT, API_METHOD,
    API_RESOURCE, API_STAGE, LAMBDA_FUNCTION, LAMBDA_PERMISSION, REST_API,
};
use endpoint_stack_core::{
    construct_endpoint_stack, synthesize, App, ConstructKind, EndpointStackConfig, HandlerRef,
    Runtime, SynthError,
};
use serde_json::json;
use support::{MissingResolver, StaticResolver};

const STACK_ID: &str = "TransactionParserCdkAppStack";

fn synth(config: &EndpointStackConfig) -> (App, endpoint_stack_core::CloudAssembly) {
    let mut app = App::new();
    construct_endpoint_stack(&mut app, STACK_ID, config)
        .expect("stack should construct");
    let assembly = synthesize(&app, &StaticResolver::default())
        .expect("stack should synthesize");
    (app, assembly)
}

#[test]
fn default_stack_has_one_function_and_one_rest_api() {
    let (app, assembly) = synth(&EndpointStackConfig::default());
    let (stack, _) = app.stacks().next().expect("stack registered");

    let counts = construct_counts(app.tree(), stack);
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["Function"], 1);
    assert_eq!(counts["LambdaRestApi"], 1);

    let template = &assembly.stack(STACK_ID).expect("stack artifact").template;
    assert_eq!(template.resources_of_type(LAMBDA_FUNCTION).count(), 1);
    assert_eq!(template.resources_of_type(REST_API).count(), 1);
}

#[test]
fn rest_api_integrates_with_the_function_of_the_same_pass() {
    let mut app = App::new();
    let handles = construct_endpoint_stack(&mut app, STACK_ID, &EndpointStackConfig::default())
        .expect("stack should construct");

    let ConstructKind::LambdaRestApi { target, .. } = &app.tree().node(handles.api).kind else {
        panic!("api construct has unexpected kind");
    };
    assert_eq!(*target, handles.function);

    let assembly = synthesize(&app, &StaticResolver::default())
        .expect("synthesize");
    let template = &assembly.stacks[0].template;
    let function_id = function_logical_id(app.tree(), handles.function);

    let methods: Vec<_> = template.resources_of_type(API_METHOD).collect();
    assert_eq!(methods.len(), 2);
    for (_, method) in methods {
        let uri = &method.properties["Integration"]["Uri"]["Fn::Join"][1];
        assert_eq!(uri[5], json!({"Fn::GetAtt": [function_id, "Arn"]}));
        assert_eq!(method.properties["HttpMethod"], "ANY");
        assert_eq!(method.properties["Integration"]["Type"], "AWS_PROXY");
    }

    for (_, permission) in template.resources_of_type(LAMBDA_PERMISSION) {
        assert_eq!(
            permission.properties["FunctionName"],
            json!({"Fn::GetAtt": [function_id, "Arn"]})
        );
    }
}

#[test]
fn synthesis_is_idempotent() {
    let config = EndpointStackConfig::default();
    let (_, first) = synth(&config);
    let (_, second) = synth(&config);

    assert_eq!(first, second);
    let first_json = serde_json::to_string(&first.stacks[0].template);
    let second_json = serde_json::to_string(&second.stacks[0].template);
    assert_eq!(
        first_json.expect("serialize"),
        second_json.expect("serialize")
    );
}

#[test]
fn handler_change_only_touches_the_function_handler() {
    let base = EndpointStackConfig::default();
    let mut changed = base.clone();
    changed.function.handler = HandlerRef::new("rewards.entry.main");

    let (app, first) = synth(&base);
    let (_, second) = synth(&changed);
    let first = &first.stacks[0].template;
    let second = &second.stacks[0].template;

    assert_eq!(
        first.resources.keys().collect::<Vec<_>>(),
        second.resources.keys().collect::<Vec<_>>()
    );

    let (stack, _) = app.stacks().next().expect("stack");
    let function = app.tree().children(stack).next().expect("function").0;
    let function_id = function_logical_id(app.tree(), function);

    for (logical_id, resource) in &first.resources {
        let other = &second.resources[logical_id];
        if *logical_id == function_id {
            let mut expected = resource.clone();
            expected.properties["Handler"] = json!("rewards.entry.main");
            assert_eq!(other, &expected);
        } else {
            assert_eq!(other, resource, "{logical_id} changed unexpectedly");
        }
    }
    assert_eq!(first.outputs, second.outputs);
}

#[test]
fn empty_configuration_falls_back_to_documented_defaults() {
    let config: EndpointStackConfig = serde_json::from_str("{}").expect("config should parse");
    let (app, assembly) = synth(&config);
    let artifact = assembly.stack(STACK_ID).expect("artifact");

    assert_eq!(
        artifact.environment,
        format!("aws://{UNKNOWN_ACCOUNT}/{DEFAULT_REGION}")
    );

    let (_, stage) = artifact
        .template
        .resources_of_type(API_STAGE)
        .next()
        .expect("stage");
    assert_eq!(stage.properties["StageName"], DEFAULT_STAGE_NAME);

    let (stack, _) = app.stacks().next().expect("stack");
    let function = app.tree().children(stack).next().expect("function").0;
    let resource = artifact
        .template
        .resource(&function_logical_id(app.tree(), function))
        .expect("function");
    assert_eq!(resource.properties["Runtime"], "python3.9");
    assert_eq!(
        resource.properties["Handler"],
        "rewardPointsCalculator.lambda_handler.handler"
    );
    assert!(artifact.template.description.is_none());
}

#[test]
fn unsupported_runtime_fails_instead_of_defaulting() {
    let result = serde_json::from_value::<EndpointStackConfig>(json!({
        "function": {"runtime": "nodejs12.x"}
    }));
    assert!(result.is_err());

    let parsed = "nodejs12.x".parse::<Runtime>();
    assert!(matches!(parsed, Err(SynthError::UnsupportedRuntime(_))));
}

#[test]
fn handler_shape_is_checked_against_the_runtime() {
    let mut config = EndpointStackConfig::default();
    config.function.handler = HandlerRef::new("no_module");

    let mut app = App::new();
    let error = construct_endpoint_stack(&mut app, STACK_ID, &config)
        .expect_err("handler without module should fail");
    assert!(matches!(error, SynthError::InvalidHandler { .. }));
}

#[test]
fn unresolved_code_path_fails_synthesis() {
    let mut app = App::new();
    construct_endpoint_stack(&mut app, STACK_ID, &EndpointStackConfig::default())
        .expect("construction does not touch the code path");

    let error = synthesize(&app, &MissingResolver)
        .expect_err("synthesis should fail");
    assert!(matches!(error, SynthError::UnresolvedAsset { .. }));
}

#[test]
fn proxy_resource_hangs_off_the_api_root() {
    let (app, assembly) = synth(&EndpointStackConfig::default());
    let template = &assembly.stacks[0].template;
    let (stack, _) = app.stacks().next().expect("stack");
    let api = app.tree().children(stack).nth(1).expect("api").0;
    let api_id = rest_api_logical_id(app.tree(), api);

    let (_, proxy) = template
        .resources_of_type(API_RESOURCE)
        .next()
        .expect("proxy resource");
    assert_eq!(proxy.properties["PathPart"], "{proxy+}");
    assert_eq!(
        proxy.properties["ParentId"],
        json!({"Fn::GetAtt": [api_id, "RootResourceId"]})
    );

    let (_, deployment) = template
        .resources_of_type(API_DEPLOYMENT)
        .next()
        .expect("deployment");
    assert_eq!(deployment.properties["RestApiId"], json!({"Ref": api_id}));
}

#[test]
fn tree_mirrors_the_construct_hierarchy() {
    let (_, assembly) = synth(&EndpointStackConfig::default());
    let stack = &assembly.tree.children[STACK_ID];

    let function = &stack.children["TransactionHandler"];
    let api = &stack.children["Endpoint"];

    assert_eq!(stack.construct_type, "Stack");
    assert_eq!(function.construct_type, "Function");
    assert_eq!(api.construct_type, "LambdaRestApi");
    assert_eq!(api.path, format!("{STACK_ID}/Endpoint"));
}
