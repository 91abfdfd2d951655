//! Builder for wiring state machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::State;
use crate::machine::{BehaviorHandler, HandlerRegistry, StateAssistant, StateMachine, Subject};
use std::sync::Arc;

/// Builder for constructing state machines with a fluent API.
///
/// Collects exactly one [`StateAssistant`] and any number of
/// [`BehaviorHandler`]s, then validates the wiring in [`build`](Self::build).
pub struct StateMachineBuilder<T: Subject, S: State> {
    assistants: Vec<Arc<dyn StateAssistant<T, S>>>,
    handlers: Vec<Arc<dyn BehaviorHandler<T, S>>>,
    config: MachineConfig,
}

impl<T: Subject + 'static, S: State + 'static> StateMachineBuilder<T, S> {
    pub fn new() -> Self {
        Self {
            assistants: Vec::new(),
            handlers: Vec::new(),
            config: MachineConfig::default(),
        }
    }

    /// Set the state assistant (required, exactly once).
    pub fn assistant<A>(mut self, assistant: Arc<A>) -> Self
    where
        A: StateAssistant<T, S> + 'static,
    {
        self.assistants.push(assistant);
        self
    }

    /// Register a handler for the event it declares.
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: BehaviorHandler<T, S> + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Register an already shared handler.
    pub fn shared_handler(mut self, handler: Arc<dyn BehaviorHandler<T, S>>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Register a batch of handlers, e.g. the result of a plugin scan.
    pub fn handlers<I>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn BehaviorHandler<T, S>>>,
    {
        self.handlers.extend(handlers);
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the state machine.
    ///
    /// Fails when the assistant is missing or supplied more than once, when
    /// no handlers were registered, or when two handlers claim the same event.
    pub fn build(mut self) -> Result<StateMachine<T, S>, BuildError> {
        let assistant = match self.assistants.len() {
            0 => return Err(BuildError::MissingAssistant),
            1 => self.assistants.remove(0),
            n => return Err(BuildError::AmbiguousAssistant(n)),
        };

        if self.handlers.is_empty() {
            return Err(BuildError::NoHandlers);
        }

        let registry = HandlerRegistry::from_handlers(self.handlers)?;
        Ok(StateMachine::new(assistant, registry, self.config))
    }
}

impl<T: Subject + 'static, S: State + 'static> Default for StateMachineBuilder<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DrivenEvent;
    use crate::machine::{FnHandler, InMemoryStateAssistant};

    crate::state_enum! {
        enum Lease {
            Offered,
            Signed,
            Ended,
        }
        final: [Ended]
    }

    fn sign() -> DrivenEvent<Lease> {
        DrivenEvent::new("sign", Lease::Offered, Lease::Signed)
    }

    fn end() -> DrivenEvent<Lease> {
        DrivenEvent::new("end", Lease::Signed, Lease::Ended)
    }

    #[test]
    fn builder_requires_assistant() {
        let result = StateMachineBuilder::<String, Lease>::new()
            .handler(FnHandler::noop(sign()))
            .build();

        assert!(matches!(result, Err(BuildError::MissingAssistant)));
    }

    #[test]
    fn builder_rejects_second_assistant() {
        let result = StateMachineBuilder::<String, Lease>::new()
            .assistant(Arc::new(InMemoryStateAssistant::new()))
            .assistant(Arc::new(InMemoryStateAssistant::new()))
            .handler(FnHandler::noop(sign()))
            .build();

        assert!(matches!(result, Err(BuildError::AmbiguousAssistant(2))));
    }

    #[test]
    fn builder_requires_handlers() {
        let result = StateMachineBuilder::<String, Lease>::new()
            .assistant(Arc::new(InMemoryStateAssistant::new()))
            .build();

        assert!(matches!(result, Err(BuildError::NoHandlers)));
    }

    #[test]
    fn builder_rejects_duplicate_handlers() {
        let result = StateMachineBuilder::<String, Lease>::new()
            .assistant(Arc::new(InMemoryStateAssistant::new()))
            .handler(FnHandler::noop(sign()))
            .handler(FnHandler::noop(sign()))
            .build();

        match result {
            Err(err) => {
                assert_eq!(err, BuildError::DuplicateHandlers(vec!["sign".to_string()]));
                assert!(err.to_string().contains("sign"));
            }
            Ok(_) => panic!("Expected duplicate handler error"),
        }
    }

    #[test]
    fn fluent_api_builds_machine() {
        let batch: Vec<Arc<dyn BehaviorHandler<String, Lease>>> =
            vec![Arc::new(FnHandler::<String, Lease>::noop(end()))];

        let machine = StateMachineBuilder::<String, Lease>::new()
            .assistant(Arc::new(InMemoryStateAssistant::new()))
            .handler(FnHandler::noop(sign()))
            .handlers(batch)
            .config(MachineConfig {
                serialize_per_subject: false,
            })
            .build()
            .unwrap();

        assert_eq!(machine.handler_count(), 2);
        assert!(machine.has_handler(&sign()));
        assert!(machine.has_handler(&end()));
        assert!(!machine.config().serialize_per_subject);
    }
}
