//! The construct tree: an arena of scopes and the resources registered in them.

use serde::Serialize;
use tracing::debug;

use crate::config::{FunctionProps, RestApiProps, StackProps};
use crate::error::SynthError;
use crate::ids::{validate_construct_id, validate_stack_id};

/// Handle to a node of a [`ConstructTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstructKind {
    App,
    Stack(StackProps),
    Function(FunctionProps),
    LambdaRestApi {
        props: RestApiProps,
        /// The function every request is proxied to. Not owned by the api.
        target: NodeId,
    },
}

impl ConstructKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::App => "App",
            Self::Stack(_) => "Stack",
            Self::Function(_) => "Function",
            Self::LambdaRestApi { .. } => "LambdaRestApi",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructNode {
    pub id: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: ConstructKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructTree {
    nodes: Vec<ConstructNode>,
}

impl ConstructTree {
    fn new() -> Self {
        Self {
            nodes: vec![ConstructNode {
                id: String::new(),
                parent: None,
                children: Vec::new(),
                kind: ConstructKind::App,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Panics when `id` was not issued by this tree; use [`Self::get`] for
    /// handles of unknown origin.
    pub fn node(&self, id: NodeId) -> &ConstructNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&ConstructNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &ConstructNode)> {
        self.nodes[id.0]
            .children
            .iter()
            .map(move |child| (*child, &self.nodes[child.0]))
    }

    /// Depth-first walk below `id`, in registration order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            let children = &self.nodes[next.0].children;
            stack.extend(children.iter().rev().copied());
        }
        out
    }

    /// Ids from the enclosing stack (exclusive) down to `id`.
    pub fn path_in_stack(&self, id: NodeId) -> Vec<&str> {
        let mut components = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            if matches!(node.kind, ConstructKind::Stack(_) | ConstructKind::App) {
                break;
            }
            components.push(node.id.as_str());
            cursor = node.parent;
        }
        components.reverse();
        components
    }

    /// Full path from the app root, e.g. `MyStack/Endpoint`.
    pub fn path(&self, id: NodeId) -> String {
        let mut components = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            if !matches!(node.kind, ConstructKind::App) {
                components.push(node.id.as_str());
            }
            cursor = node.parent;
        }
        components.reverse();
        components.join("/")
    }

    pub fn enclosing_stack(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if matches!(self.nodes[current.0].kind, ConstructKind::Stack(_)) {
                return Some(current);
            }
            cursor = self.nodes[current.0].parent;
        }
        None
    }

    fn add(&mut self, parent: NodeId, id: &str, kind: ConstructKind) -> Result<NodeId, SynthError> {
        validate_construct_id(id)?;
        if self.children(parent).any(|(_, child)| child.id == id) {
            return Err(SynthError::DuplicateConstruct {
                parent: self.path(parent),
                id: id.to_string(),
            });
        }

        let node_id = NodeId(self.nodes.len());
        debug!(
            parent = %self.path(parent),
            id,
            kind = kind.type_name(),
            "registering construct"
        );
        self.nodes.push(ConstructNode {
            id: id.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(node_id);
        Ok(node_id)
    }
}

/// Root scope of a synthesis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct App {
    tree: ConstructTree,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            tree: ConstructTree::new(),
        }
    }

    pub fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    pub fn stacks(&self) -> impl Iterator<Item = (NodeId, &ConstructNode)> {
        self.tree
            .children(self.tree.root())
            .filter(|(_, node)| matches!(node.kind, ConstructKind::Stack(_)))
    }

    pub fn add_stack(&mut self, id: &str, props: StackProps) -> Result<NodeId, SynthError> {
        validate_stack_id(id)?;
        props.validate()?;
        let root = self.tree.root();
        self.tree.add(root, id, ConstructKind::Stack(props))
    }

    pub fn add_function(
        &mut self,
        scope: NodeId,
        id: &str,
        props: FunctionProps,
    ) -> Result<NodeId, SynthError> {
        self.require_stack_scope(scope)?;
        props.validate()?;
        self.tree.add(scope, id, ConstructKind::Function(props))
    }

    pub fn add_lambda_rest_api(
        &mut self,
        scope: NodeId,
        id: &str,
        target: NodeId,
        props: RestApiProps,
    ) -> Result<NodeId, SynthError> {
        self.require_stack_scope(scope)?;
        props.validate()?;

        let Some(target_node) = self.tree.get(target) else {
            return Err(unknown_node(target));
        };
        if !matches!(target_node.kind, ConstructKind::Function(_)) {
            return Err(SynthError::UnexpectedConstruct(self.tree.path(target)));
        }
        if self.tree.enclosing_stack(target) != Some(scope) {
            return Err(SynthError::InvalidRestApi(format!(
                "target '{}' must belong to the same stack",
                self.tree.path(target)
            )));
        }

        self.tree
            .add(scope, id, ConstructKind::LambdaRestApi { props, target })
    }

    fn require_stack_scope(&self, scope: NodeId) -> Result<(), SynthError> {
        match self.tree.get(scope).map(|node| &node.kind) {
            Some(ConstructKind::Stack(_)) => Ok(()),
            Some(_) => Err(SynthError::UnexpectedConstruct(self.tree.path(scope))),
            None => Err(unknown_node(scope)),
        }
    }
}

fn unknown_node(id: NodeId) -> SynthError {
    SynthError::UnexpectedConstruct(format!("<unknown node #{}>", id.index()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_stack() -> (App, NodeId) {
        let mut app = App::new();
        let stack = app
            .add_stack("Stack", StackProps::default())
            .expect("stack should register");
        (app, stack)
    }

    #[test]
    fn rejects_duplicate_sibling_ids() {
        let (mut app, stack) = app_with_stack();
        app.add_function(stack, "Fn", FunctionProps::default())
            .expect("function should register");

        let error = app
            .add_function(stack, "Fn", FunctionProps::default())
            .expect_err("duplicate should fail");
        assert!(matches!(error, SynthError::DuplicateConstruct { .. }));
    }

    #[test]
    fn paths_are_rooted_at_the_stack() {
        let (mut app, stack) = app_with_stack();
        let function = app
            .add_function(stack, "Fn", FunctionProps::default())
            .expect("function should register");

        assert_eq!(app.tree().path(function), "Stack/Fn");
        assert_eq!(app.tree().path_in_stack(function), vec!["Fn"]);
        assert_eq!(app.tree().enclosing_stack(function), Some(stack));
    }

    #[test]
    fn rest_api_target_must_be_a_function() {
        let (mut app, stack) = app_with_stack();
        let error = app
            .add_lambda_rest_api(stack, "Api", stack, RestApiProps::default())
            .expect_err("stack is not a valid target");
        assert!(matches!(error, SynthError::UnexpectedConstruct(_)));
    }

    #[test]
    fn rest_api_target_must_live_in_the_same_stack() {
        let mut app = App::new();
        let first = app
            .add_stack("First", StackProps::default())
            .expect("stack");
        let second = app
            .add_stack("Second", StackProps::default())
            .expect("stack");
        let function = app
            .add_function(first, "Fn", FunctionProps::default())
            .expect("function");

        let error = app
            .add_lambda_rest_api(second, "Api", function, RestApiProps::default())
            .expect_err("cross-stack target should fail");
        assert!(matches!(error, SynthError::InvalidRestApi(_)));
    }

    #[test]
    fn descendants_follow_registration_order() {
        let (mut app, stack) = app_with_stack();
        let function = app
            .add_function(stack, "Fn", FunctionProps::default())
            .expect("function");
        let api = app
            .add_lambda_rest_api(stack, "Api", function, RestApiProps::default())
            .expect("api");

        assert_eq!(app.tree().descendants(stack), vec![function, api]);
    }

    #[test]
    fn handles_from_another_app_are_rejected() {
        let (mut other, other_stack) = app_with_stack();
        let foreign = other
            .add_function(other_stack, "Fn", FunctionProps::default())
            .expect("function");
        let foreign_scope = other
            .add_stack("Later", StackProps::default())
            .expect("stack");

        let (mut app, stack) = app_with_stack();
        let error = app
            .add_lambda_rest_api(stack, "Api", foreign, RestApiProps::default())
            .expect_err("unknown target should fail");
        assert!(matches!(error, SynthError::UnexpectedConstruct(_)));

        let error = app
            .add_function(foreign_scope, "Fn", FunctionProps::default())
            .expect_err("unknown scope should fail");
        assert!(matches!(error, SynthError::UnexpectedConstruct(_)));
        assert_eq!(app.tree().len(), 2);
    }
}
