//! Registered-action lookup.
//!
//! Scheduled work names an action; the registry resolves the name to an
//! implementation only at fire time. This keeps the scheduler decoupled
//! from the concrete external clients (posting adapters, control channels)
//! that actions drive.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use vigil_error::VigilResult;

/// An executable action resolvable by name.
///
/// Implementations wrap the external side effect a scheduled task performs:
/// send a message, publish a post. The scheduler treats them as opaque and
/// time-boxed; a hang here stalls only the spawned execution task, never
/// the timer loop.
#[async_trait::async_trait]
pub trait ScheduledAction: Send + Sync {
    /// The name tasks reference this action by (e.g. "discord.send_message").
    fn name(&self) -> &str;

    /// Execute the action with the task's arguments.
    async fn run(&self, args: &JsonValue) -> VigilResult<()>;
}

/// Registry of named actions.
///
/// # Examples
///
/// ```rust,ignore
/// let mut registry = ActionRegistry::new();
/// registry.register(SendMessageAction::new(channel));
/// let action = registry.get("discord.send_message").unwrap();
/// ```
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn ScheduledAction>>,
}

impl ActionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        tracing::debug!("Creating new ActionRegistry");
        Self {
            actions: HashMap::new(),
        }
    }

    /// Register an action under its name.
    pub fn register<A: ScheduledAction + 'static>(&mut self, action: A) -> &mut Self {
        let name = action.name().to_string();
        tracing::info!(action = %name, "Registering scheduled action");
        self.actions.insert(name, Arc::new(action));
        self
    }

    /// Resolve an action by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ScheduledAction>> {
        self.actions.get(name).cloned()
    }

    /// Check whether an action is registered.
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// List all registered action names.
    pub fn action_names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAction {
        name: String,
        runs: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ScheduledAction for CountingAction {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _args: &JsonValue) -> VigilResult<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn registered_action_resolves_and_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = ActionRegistry::new();
        registry.register(CountingAction {
            name: "test.count".to_string(),
            runs: runs.clone(),
        });

        assert!(registry.has_action("test.count"));
        let action = registry.get("test.count").unwrap();
        action.run(&serde_json::json!({})).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_action_resolves_to_none() {
        let registry = ActionRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(!registry.has_action("missing"));
    }
}
