//! Builder pattern implementation for state machines

use crate::hierarchy::{Hierarchy, DEFAULT_MAX_NESTING};
use crate::{Error, StateMachine, Stateful};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

type SuperstateFn<S> = Box<dyn Fn(&S) -> Option<S> + Send + Sync>;

struct Registration<S, CTX, E> {
    id: S,
    parent: Option<S>,
    handler: Box<dyn Stateful<S, CTX, E>>,
}

/// Builder for constructing state machines
pub struct StateMachineBuilder<S, CTX, E> {
    name: String,
    context: CTX,
    top: Option<Registration<S, CTX, E>>,
    states: Vec<Registration<S, CTX, E>>,
    names: HashMap<S, String>,
    superstate_fn: Option<SuperstateFn<S>>,
    max_nesting: usize,
}

impl<S, CTX, E> StateMachineBuilder<S, CTX, E>
where
    S: Clone + Debug + Eq + Hash + 'static,
    CTX: 'static,
    E: Debug + 'static,
{
    /// Create a new builder for a machine called `name` with the given context
    pub fn new(name: impl Into<String>, context: CTX) -> Self {
        Self {
            name: name.into(),
            context,
            top: None,
            states: Vec::new(),
            names: HashMap::new(),
            superstate_fn: None,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }

    /// Set the top (root) state and its handler
    pub fn top<T>(mut self, state_id: S, state_impl: T) -> Self
    where
        T: Stateful<S, CTX, E> + 'static,
    {
        self.top = Some(Registration {
            id: state_id,
            parent: None,
            handler: Box::new(state_impl),
        });
        self
    }

    /// Add a state whose superstate comes from the superstate function
    pub fn state<T>(mut self, state_id: S, state_impl: T) -> Self
    where
        T: Stateful<S, CTX, E> + 'static,
    {
        self.states.push(Registration {
            id: state_id,
            parent: None,
            handler: Box::new(state_impl),
        });
        self
    }

    /// Add a state nested directly in `superstate`
    pub fn substate<T>(mut self, state_id: S, superstate: S, state_impl: T) -> Self
    where
        T: Stateful<S, CTX, E> + 'static,
    {
        self.states.push(Registration {
            id: state_id,
            parent: Some(superstate),
            handler: Box::new(state_impl),
        });
        self
    }

    /// Set the superstate function for states added with [`state`](Self::state)
    pub fn superstate_fn<F>(mut self, func: F) -> Self
    where
        F: Fn(&S) -> Option<S> + Send + Sync + 'static,
    {
        self.superstate_fn = Some(Box::new(func));
        self
    }

    /// Diagnostic name of a state, used in logs and diagrams. Defaults to the
    /// `Debug` rendering of the id.
    pub fn display_name(mut self, state_id: S, name: impl Into<String>) -> Self {
        self.names.insert(state_id, name.into());
        self
    }

    /// Maximum nesting depth, top counting as the first level
    pub fn max_nesting(mut self, limit: usize) -> Self {
        self.max_nesting = limit;
        self
    }

    /// Validate the topology and build the state machine
    pub fn build(mut self) -> Result<StateMachine<S, CTX, E>, Error<S>> {
        let top = self.top.take().ok_or(Error::MissingTop)?;

        let mut handlers = Vec::with_capacity(self.states.len() + 1);
        let mut topology = Vec::with_capacity(self.states.len());

        let top_name = self.name_of(&top.id);
        handlers.push(top.handler);

        for registration in std::mem::take(&mut self.states) {
            let parent = match registration.parent {
                Some(parent) => parent,
                None => self
                    .superstate_fn
                    .as_ref()
                    .and_then(|f| f(&registration.id))
                    .ok_or_else(|| Error::OrphanState(registration.id.clone()))?,
            };
            let name = self.name_of(&registration.id);
            topology.push((registration.id, name, parent));
            handlers.push(registration.handler);
        }

        let hierarchy = Hierarchy::with_names((top.id, top_name), topology, self.max_nesting)?;

        Ok(StateMachine::new(self.name, hierarchy, handlers, self.context))
    }

    fn name_of(&self, state_id: &S) -> String {
        self.names
            .get(state_id)
            .cloned()
            .unwrap_or_else(|| format!("{:?}", state_id))
    }
}
