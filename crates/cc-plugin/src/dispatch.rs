//! Action dispatch
//!
//! Runs each declared action, in order, through the runner registered under
//! its name. Actions without a runner are skipped; a failing runner stops the
//! sequence unless it allows continuing.

use crate::error::{PluginError, PluginResult};
use crate::manager::PluginManager;
use crate::runner::{ActionContext, ActionRegistry};
use std::fmt;

/// Lifecycle of one declared action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionState {
    /// Not reached yet
    Pending,
    /// Runner is executing
    Running,
    /// Runner returned successfully
    Completed,
    /// Runner failed and dispatch continued
    Failed,
    /// No runner registered for the action name
    Skipped,
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        })
    }
}

/// Final state of one action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Action name
    pub name: String,
    /// Final state
    pub state: ActionState,
    /// Runner error message, for failed actions
    pub error: Option<String>,
}

/// Result of a dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    outcomes: Vec<ActionOutcome>,
}

impl RunReport {
    /// Outcomes in declaration order
    #[inline]
    #[must_use]
    pub fn outcomes(&self) -> &[ActionOutcome] {
        &self.outcomes
    }

    /// State of the first action named `name`
    #[must_use]
    pub fn state_of(&self, name: &str) -> Option<ActionState> {
        self.outcomes.iter().find(|o| o.name == name).map(|o| o.state)
    }

    /// Number of actions in `state`
    #[must_use]
    pub fn count(&self, state: ActionState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Actions that failed with continue-on-error set
    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| o.state == ActionState::Failed)
    }

    /// Check if no action failed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Turn recorded failures into an error
    ///
    /// # Errors
    /// Returns `PluginError::ActionFailures` naming every failed action.
    pub fn ensure_success(&self) -> PluginResult<()> {
        let failed: Vec<String> = self.failures().map(|o| o.name.clone()).collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(PluginError::ActionFailures(failed))
        }
    }
}

pub(crate) fn run_actions(manager: &PluginManager, registry: &ActionRegistry) -> PluginResult<RunReport> {
    let payload = manager.payload();
    let mut report = RunReport {
        outcomes: payload
            .actions
            .iter()
            .map(|action| ActionOutcome {
                name: action.name.clone(),
                state: ActionState::Pending,
                error: None,
            })
            .collect(),
    };

    for (index, action) in payload.actions.iter().enumerate() {
        let Some(mut runner) = registry.create(&action.name) else {
            tracing::debug!(action = %action.name, "no runner registered, skipping");
            report.outcomes[index].state = ActionState::Skipped;
            continue;
        };

        let span = tracing::info_span!("action", name = %action.name);
        let _guard = span.enter();

        let ctx = ActionContext::new(manager, action, &action.name, manager.action_io(index)?);
        report.outcomes[index].state = ActionState::Running;
        tracing::info!("Running {}", action.name);

        match runner.run(&ctx) {
            Ok(()) => {
                report.outcomes[index].state = ActionState::Completed;
                tracing::info!("Completed {}", action.name);
            }
            Err(source) if runner.continue_on_error() => {
                tracing::warn!(error = %source, "action failed, continuing");
                report.outcomes[index].state = ActionState::Failed;
                report.outcomes[index].error = Some(source.to_string());
            }
            Err(source) => {
                tracing::error!(error = %source, "action failed");
                return Err(PluginError::Dispatch {
                    action: action.name.clone(),
                    source,
                });
            }
        }
    }

    tracing::info!(
        completed = report.count(ActionState::Completed),
        failed = report.count(ActionState::Failed),
        skipped = report.count(ActionState::Skipped),
        "dispatch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, state: ActionState) -> ActionOutcome {
        ActionOutcome {
            name: name.to_string(),
            state,
            error: None,
        }
    }

    #[test]
    fn report_counts_and_failures() {
        let report = RunReport {
            outcomes: vec![
                outcome("a", ActionState::Completed),
                outcome("b", ActionState::Skipped),
                outcome("c", ActionState::Failed),
            ],
        };

        assert_eq!(report.count(ActionState::Completed), 1);
        assert_eq!(report.state_of("b"), Some(ActionState::Skipped));
        assert!(!report.is_success());
        assert!(matches!(
            report.ensure_success(),
            Err(PluginError::ActionFailures(names)) if names == vec!["c".to_string()]
        ));
    }

    #[test]
    fn empty_report_succeeds() {
        let report = RunReport::default();
        assert!(report.is_success());
        assert!(report.ensure_success().is_ok());
        assert_eq!(ActionState::Skipped.to_string(), "skipped");
    }
}
