//! # Exception Resolvers
//!
//! Map a flow fault, and the event it happened on, to an action. A
//! resolver is total: it always answers and never fails.

use serde::{Deserialize, Serialize};

use super::action::ExceptionAction;
use super::errors::{ExceptionError, ExceptionResult};
use crate::event::Event;
use crate::flow::FlowFault;

/// Decides what an initiator does about a flow fault
pub trait ExceptionResolver: Send + Sync {
    fn resolve(&self, initiator_name: &str, event: &Event, fault: &FlowFault) -> ExceptionAction;
}

impl<F> ExceptionResolver for F
where
    F: Fn(&str, &Event, &FlowFault) -> ExceptionAction + Send + Sync,
{
    fn resolve(&self, initiator_name: &str, event: &Event, fault: &FlowFault) -> ExceptionAction {
        self(initiator_name, event, fault)
    }
}

/// A single resolution rule. Unset criteria match anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRule {
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub component: Option<String>,

    pub action: ExceptionAction,
}

impl ExceptionRule {
    fn matches(&self, fault: &FlowFault) -> bool {
        let kind_matches = self.kind.as_deref().map_or(true, |k| k == fault.kind());
        let component_matches = self
            .component
            .as_deref()
            .map_or(true, |c| Some(c) == fault.component());
        kind_matches && component_matches
    }
}

/// Resolves by the first matching rule, in registration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingExceptionResolver {
    #[serde(default)]
    rules: Vec<ExceptionRule>,

    #[serde(default = "default_action")]
    default_action: ExceptionAction,
}

fn default_action() -> ExceptionAction {
    ExceptionAction::rollback_stop()
}

impl Default for MatchingExceptionResolver {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_action: default_action(),
        }
    }
}

impl MatchingExceptionResolver {
    /// Resolver that stops on anything unmatched
    pub fn new() -> Self {
        Self::default()
    }

    /// Action for faults no rule matches
    pub fn with_default(mut self, action: ExceptionAction) -> Self {
        self.default_action = action;
        self
    }

    /// Resolve faults of `kind`
    pub fn on_kind(mut self, kind: impl Into<String>, action: ExceptionAction) -> Self {
        self.rules.push(ExceptionRule {
            kind: Some(kind.into()),
            component: None,
            action,
        });
        self
    }

    /// Resolve any fault raised by `component`
    pub fn on_component(mut self, component: impl Into<String>, action: ExceptionAction) -> Self {
        self.rules.push(ExceptionRule {
            kind: None,
            component: Some(component.into()),
            action,
        });
        self
    }

    /// Resolve faults of `kind` raised by `component`
    pub fn on_component_kind(
        mut self,
        component: impl Into<String>,
        kind: impl Into<String>,
        action: ExceptionAction,
    ) -> Self {
        self.rules.push(ExceptionRule {
            kind: Some(kind.into()),
            component: Some(component.into()),
            action,
        });
        self
    }

    pub fn rules(&self) -> &[ExceptionRule] {
        &self.rules
    }

    /// Parse rules from a JSON document and validate every action
    pub fn from_json_str(json: &str) -> ExceptionResult<Self> {
        let resolver: Self =
            serde_json::from_str(json).map_err(|e| ExceptionError::Parse(e.to_string()))?;
        resolver.validate()?;
        Ok(resolver)
    }

    /// Check the default action and every rule's action
    pub fn validate(&self) -> ExceptionResult<()> {
        self.default_action.validate()?;
        for rule in &self.rules {
            rule.action.validate()?;
        }
        Ok(())
    }
}

impl ExceptionResolver for MatchingExceptionResolver {
    fn resolve(&self, _initiator_name: &str, _event: &Event, fault: &FlowFault) -> ExceptionAction {
        self.rules
            .iter()
            .find(|rule| rule.matches(fault))
            .map(|rule| rule.action)
            .unwrap_or(self.default_action)
    }
}
