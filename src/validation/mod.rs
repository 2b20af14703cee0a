//! Build-time validation.
//!
//! Checks run in a fixed order and stop at the first violation:
//!
//! 1. required fields ([`cardinality`])
//! 2. absent list elements ([`cardinality`], builder only)
//! 3. field and envelope types, choice alternatives ([`choice`])
//! 4. reference target kinds, then reference consistency ([`reference`])
//! 5. primitive representation and lexical format ([`primitive`])
//! 6. contained resources nesting, then ele-1 ([`element`])

pub mod cardinality;
pub mod choice;
pub mod element;
pub mod primitive;
pub mod reference;

use crate::config::BuildConfig;
use crate::error::{ValidationError, ViolationKind};
use crate::types::Node;
use crate::visitor::{PathVisitor, Visitor};

pub type CheckResult = std::result::Result<(), ValidationError>;

/// Violation anchored at `type_name` (plus the field, when the kind has one)
pub(crate) fn local_error(type_name: &str, kind: ViolationKind) -> ValidationError {
    ValidationError::new(kind, String::new()).relocate(type_name)
}

/// Run every local check on `node`, regardless of `config.validate`.
///
/// Children are not descended into; see [`validate_tree`].
pub fn validate(node: &Node, config: &BuildConfig) -> CheckResult {
    if let Some(schema) = node.schema() {
        let fields = &node.data().fields;
        cardinality::check_required(schema, |index| {
            fields.get(index).is_some_and(Option::is_some)
        })?;
    }
    check_content(node, config)
}

/// Everything after the required and absent-element stages
pub(crate) fn check_content(node: &Node, config: &BuildConfig) -> CheckResult {
    tracing::trace!("Checking types of {}", node.type_name());
    choice::check_types(node)?;

    if config.check_reference_types {
        tracing::trace!("Checking references of {}", node.type_name());
        reference::check_target_kinds(node)?;
        reference::check_consistency(node)?;
    }

    primitive::check(node, config.check_primitive_formats)?;
    element::check_nested_contained(node)?;

    if config.require_value_or_children {
        element::check_value_or_children(node)?;
    }
    Ok(())
}

/// Validate `node` and every node below it, pre-order. The violation path is
/// the full path from the root, e.g. `DeviceRequest.parameter[1].code`.
pub fn validate_tree(node: &Node, config: &BuildConfig) -> CheckResult {
    let mut walker = PathVisitor::new(TreeValidator {
        config,
        path: String::new(),
        failure: None,
    });
    node.accept(&mut walker);
    match walker.into_inner().failure {
        Some(err) => {
            tracing::debug!("Tree validation failed: {}", err);
            Err(err)
        }
        None => Ok(()),
    }
}

struct TreeValidator<'a> {
    config: &'a BuildConfig,
    path: String,
    failure: Option<ValidationError>,
}

impl Visitor for TreeValidator<'_> {
    fn pre_visit(&mut self, _node: &Node) -> bool {
        self.failure.is_none()
    }

    fn visit_path(&mut self, path: &str, _node: &Node) {
        self.path.clear();
        self.path.push_str(path);
    }

    fn visit(&mut self, _name: &str, _index: Option<usize>, node: &Node) -> bool {
        if self.failure.is_some() {
            return false;
        }
        match validate(node, self.config) {
            Ok(()) => true,
            Err(err) => {
                self.failure = Some(err.relocate(&self.path));
                false
            }
        }
    }
}
