//! The endpoint stack: one function behind one proxy REST API.

use tracing::info;

use crate::config::EndpointStackConfig;
use crate::construct::{App, NodeId};
use crate::error::SynthError;
use crate::ids::validate_stack_id;

pub const FUNCTION_ID: &str = "TransactionHandler";
pub const API_ID: &str = "Endpoint";

/// Handles to the constructs registered by [`construct_endpoint_stack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointStack {
    pub stack: NodeId,
    pub function: NodeId,
    pub api: NodeId,
}

/// Registers the stack, its function and the REST API targeting it under `app`.
///
/// The function is registered first; the API only holds a handle to it.
/// The whole config is validated before the tree is touched, so a failed
/// call leaves `app` unchanged.
pub fn construct_endpoint_stack(
    app: &mut App,
    id: &str,
    config: &EndpointStackConfig,
) -> Result<EndpointStack, SynthError> {
    validate_stack_id(id)?;
    config.stack.validate()?;
    config.function.validate()?;
    config.api.validate()?;

    let function_props = config.function.clone();
    let api_props = config.api.clone();

    let stack = app.add_stack(id, config.stack.clone())?;
    let function = app.add_function(stack, FUNCTION_ID, function_props)?;
    let api = app.add_lambda_rest_api(stack, API_ID, function, api_props)?;

    info!(
        stack = id,
        runtime = %config.function.runtime,
        handler = %config.function.handler,
        "constructed endpoint stack"
    );

    Ok(EndpointStack {
        stack,
        function,
        api,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ConstructKind;
    use crate::handler::HandlerRef;

    #[test]
    fn registers_function_before_api() {
        let mut app = App::new();
        let handles = construct_endpoint_stack(&mut app, "Stack", &EndpointStackConfig::default())
            .expect("stack should construct");

        let children: Vec<NodeId> = app
            .tree()
            .children(handles.stack)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(children, vec![handles.function, handles.api]);
    }

    #[test]
    fn api_targets_the_function_handle() {
        let mut app = App::new();
        let handles = construct_endpoint_stack(&mut app, "Stack", &EndpointStackConfig::default())
            .expect("stack should construct");

        match &app.tree().node(handles.api).kind {
            ConstructKind::LambdaRestApi { target, .. } => assert_eq!(*target, handles.function),
            other => panic!("unexpected construct kind {other:?}"),
        }
    }

    #[test]
    fn malformed_stack_id_fails_construction() {
        let mut app = App::new();
        let error = construct_endpoint_stack(&mut app, "bad/id", &EndpointStackConfig::default())
            .expect_err("construction should fail");
        assert!(matches!(error, SynthError::InvalidId { .. }));
        assert_eq!(app.stacks().count(), 0);
    }

    #[test]
    fn same_id_twice_in_one_app_fails() {
        let mut app = App::new();
        let config = EndpointStackConfig::default();
        construct_endpoint_stack(&mut app, "Stack", &config)
            .expect("first should construct");
        let error = construct_endpoint_stack(&mut app, "Stack", &config)
            .expect_err("second should fail");
        assert!(matches!(error, SynthError::DuplicateConstruct { .. }));
    }

    #[test]
    fn failed_construction_leaves_app_untouched() {
        let mut app = App::new();
        let mut config = EndpointStackConfig::default();
        config.function.handler = HandlerRef::new("no_module");

        let error = construct_endpoint_stack(&mut app, "Stack", &config)
            .expect_err("bad handler should fail");
        assert!(matches!(error, SynthError::InvalidHandler { .. }));
        assert_eq!(app.stacks().count(), 0);
        assert_eq!(app.tree().len(), 1);

        config.function.handler = HandlerRef::default();
        let handles = construct_endpoint_stack(&mut app, "Stack", &config)
            .expect("corrected config should construct");
        assert_eq!(app.tree().children(handles.stack).count(), 2);
    }

    #[test]
    fn invalid_function_or_api_settings_do_not_leave_a_partial_stack() {
        let mut app = App::new();
        let mut config = EndpointStackConfig::default();
        config.function.memory_size = Some(64);
        construct_endpoint_stack(&mut app, "Stack", &config)
            .expect_err("memory below the minimum should fail");

        let mut config = EndpointStackConfig::default();
        config.api.stage_name = "prod stage".to_string();
        construct_endpoint_stack(&mut app, "Stack", &config)
            .expect_err("stage name with a space should fail");

        assert_eq!(app.stacks().count(), 0);
    }

    #[test]
    fn tree_artifact_id_is_not_a_valid_stack_id() {
        let mut app = App::new();
        let error = construct_endpoint_stack(&mut app, "Tree", &EndpointStackConfig::default())
            .expect_err("reserved id should fail");
        assert!(matches!(error, SynthError::InvalidId { .. }));
        assert_eq!(app.stacks().count(), 0);
    }
}
