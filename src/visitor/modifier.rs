use std::collections::HashSet;

use super::{PathVisitor, Visitor};
use crate::error::{ValidationError, ViolationKind};
use crate::types::{Node, extension};

/// Rejects trees carrying modifier extensions the caller does not understand.
///
/// A modifier extension changes the meaning of the element it sits on, so a
/// consumer must refuse data with modifiers it cannot interpret.
#[derive(Debug, Clone, Default)]
pub struct ModifierExtensionGuard {
    understood: HashSet<String>,
    path: String,
    violation: Option<ValidationError>,
}

impl ModifierExtensionGuard {
    pub fn new<I, S>(understood: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            understood: understood.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn understands(&self, url: &str) -> bool {
        self.understood.contains(url)
    }

    /// Walk `node` and report the first modifier extension not understood
    pub fn check(&self, node: &Node) -> Result<(), ValidationError> {
        let mut walker = PathVisitor::new(Self {
            understood: self.understood.clone(),
            path: String::new(),
            violation: None,
        });
        node.accept(&mut walker);
        match walker.into_inner().violation {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    pub fn violation(&self) -> Option<&ValidationError> {
        self.violation.as_ref()
    }
}

impl Visitor for ModifierExtensionGuard {
    fn pre_visit(&mut self, _node: &Node) -> bool {
        self.violation.is_none()
    }

    fn visit_path(&mut self, path: &str, _node: &Node) {
        self.path.clear();
        self.path.push_str(path);
    }

    fn visit(&mut self, _name: &str, _index: Option<usize>, node: &Node) -> bool {
        let unknown = node.modifier_extension().iter().find_map(|ext| {
            let url = extension::url(ext).unwrap_or_default();
            (!self.understands(url)).then(|| url.to_string())
        });
        match unknown {
            Some(url) => {
                tracing::warn!("Unknown modifier extension {} at {}", url, self.path);
                self.violation = Some(
                    ValidationError::new(
                        ViolationKind::UnknownModifierExtension { url },
                        String::new(),
                    )
                    .relocate(&self.path),
                );
                false
            }
            None => true,
        }
    }
}
