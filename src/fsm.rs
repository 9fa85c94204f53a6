//! A hierarchical state machine (HSM) engine with UML-statechart semantics:
//! nested states, entry/exit actions, initial transitions and transitions
//! that exit up to the least common ancestor of source and target.
//!
//! # Type Parameters
//! - `S`: State identifier type. Must implement `Hash`, `Eq`, `Clone` and `Debug`.
//! - `CTX`: Extended state shared by every handler of one machine.
//! - `E`: User event type. May carry any payload.
//!
//! # Usage
//! 1. Implement [`Stateful`] for each state (or one type matching on the state id).
//! 2. Register the top state and its substates with a [`StateMachineBuilder`](crate::StateMachineBuilder).
//! 3. Call [`StateMachine::on_start`] once to run the initial entry/START cascade.
//! 4. Feed events through [`StateMachine::on_event`].
//!
//! Entry, exit and initial transitions are coded inside the same handler, in
//! response to [`Msg::Entry`], [`Msg::Exit`] and [`Msg::Start`]. A handler
//! that does not handle a message returns [`Response::Super`] and the engine
//! offers the message to the superstate.
//!
//! # PlantUML Export
//! If the `plantuml` feature is enabled and in debug builds, transitions and hierarchy
//! are logged and can be exported as a PlantUML diagram via [`StateMachine::export_plantuml`].
//!
//! # Errors
//! Runtime errors report broken handler contracts, such as requesting two
//! transitions while handling one event. Unhandled events are not errors.
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::hierarchy::Hierarchy;
use crate::Error;

#[cfg(all(feature = "plantuml", debug_assertions))]
use std::collections::HashMap;
#[cfg(all(feature = "plantuml", debug_assertions))]
use std::time::SystemTime;

/// Integer code of an event
pub type EventCode = u32;

/// Reserved code of [`Msg::Start`]
pub const START_EVT: EventCode = EventCode::MAX;
/// Reserved code of [`Msg::Entry`]
pub const ENTRY_EVT: EventCode = EventCode::MAX - 1;
/// Reserved code of [`Msg::Exit`]
pub const EXIT_EVT: EventCode = EventCode::MAX - 2;

/// User events that expose an integer code.
///
/// Codes start at 0 and must stay below [`EXIT_EVT`]; the top of the range
/// belongs to the engine's pseudo-events.
pub trait Signal {
    /// The event's integer code
    fn code(&self) -> EventCode;
}

/// A message delivered to a state handler: either an engine-generated
/// pseudo-event or a user event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg<E> {
    /// Resolve the state's initial transition, if any
    Start,
    /// The state becomes active
    Entry,
    /// The state becomes inactive
    Exit,
    /// A user event
    Event(E),
}

impl<E> Msg<E> {
    /// True for `Start`, `Entry` and `Exit`
    pub fn is_pseudo(&self) -> bool {
        !matches!(self, Msg::Event(_))
    }

    /// The user event, if this is one
    pub fn event(&self) -> Option<&E> {
        match self {
            Msg::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: Signal> Msg<E> {
    /// Integer code, reserved codes for pseudo-events
    pub fn code(&self) -> EventCode {
        match self {
            Msg::Start => START_EVT,
            Msg::Entry => ENTRY_EVT,
            Msg::Exit => EXIT_EVT,
            Msg::Event(e) => e.code(),
        }
    }
}

/// Outcome of a handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// The message was consumed
    Handled,
    /// Declined; the same message goes to the superstate
    Super,
}

/// Behavior bound to one state.
pub trait Stateful<S, CTX, E>: Send {
    /// Handle a message delivered to this state.
    ///
    /// # Arguments
    /// * `msg` - The pseudo-event or user event.
    /// * `hsm` - Handle to the engine, used to request transitions.
    /// * `context` - Mutable reference to the machine's shared context.
    ///
    /// # Returns
    /// [`Response::Handled`] to stop propagation, [`Response::Super`] to
    /// pass the message on to the superstate.
    fn on_event(&mut self, msg: &Msg<E>, hsm: &mut Dispatch<'_, S>, context: &mut CTX) -> Response;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Start,
    Entry,
    Exit,
    Event,
}

impl<E> From<&Msg<E>> for Phase {
    fn from(msg: &Msg<E>) -> Self {
        match msg {
            Msg::Start => Phase::Start,
            Msg::Entry => Phase::Entry,
            Msg::Exit => Phase::Exit,
            Msg::Event(_) => Phase::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Request {
    Transition { target: usize, exit_levels: usize },
    Initial { target: usize },
}

impl Request {
    fn target(&self) -> usize {
        match *self {
            Request::Transition { target, .. } | Request::Initial { target } => target,
        }
    }
}

/// Engine handle passed to a handler for the duration of one delivery.
///
/// Transition requests are recorded here and carried out by the engine once
/// the handler returns. A request that breaks the handler contract is kept
/// as a fault and surfaces as the `Err` of the enclosing `on_start` /
/// `on_event` call.
pub struct Dispatch<'a, S> {
    hierarchy: &'a Hierarchy<S>,
    current: usize,
    state: usize,
    phase: Phase,
    request: Option<Request>,
    fault: Option<Error<S>>,
}

impl<'a, S> Dispatch<'a, S>
where
    S: Clone + Debug + Eq + Hash,
{
    pub(crate) fn new(
        hierarchy: &'a Hierarchy<S>,
        current: usize,
        state: usize,
        phase: Phase,
    ) -> Self {
        Self {
            hierarchy,
            current,
            state,
            phase,
            request: None,
            fault: None,
        }
    }

    /// The active state. During exit actions this is still the state that
    /// was active before the transition.
    pub fn current(&self) -> &S {
        self.hierarchy.id(self.current)
    }

    /// The state whose handler is running
    pub fn source(&self) -> &S {
        self.hierarchy.id(self.state)
    }

    /// The machine's topology
    pub fn hierarchy(&self) -> &Hierarchy<S> {
        self.hierarchy
    }

    /// True if `state` is the active state or one of its superstates
    pub fn is_in(&self, state: &S) -> bool {
        match self.hierarchy.index_of(state) {
            Ok(idx) => self.hierarchy.is_ancestor_idx(idx, self.current),
            Err(_) => false,
        }
    }

    /// Request a transition to `target` and mark the event consumed.
    ///
    /// Only valid while handling a user event, once per delivery. States from
    /// the active state up to the least common ancestor of this state and
    /// `target` are exited, then states down to `target` are entered and
    /// `target`'s initial transitions are resolved.
    pub fn transition(&mut self, target: S) -> Response {
        let Some(target_idx) = self.resolve(&target) else {
            return Response::Handled;
        };
        if self.phase != Phase::Event {
            self.fail(Error::TransitionOutsideEvent {
                state: self.source().clone(),
                target,
            });
            return Response::Handled;
        }
        if !self.check_pending(&target) {
            return Response::Handled;
        }
        let exit_levels = self.hierarchy.exit_levels(self.state, target_idx);
        self.request = Some(Request::Transition {
            target: target_idx,
            exit_levels,
        });
        Response::Handled
    }

    /// Request the initial transition of the state being started.
    ///
    /// Only valid while handling [`Msg::Start`]; `target` must be nested
    /// strictly inside this state.
    pub fn start(&mut self, target: S) -> Response {
        let Some(target_idx) = self.resolve(&target) else {
            return Response::Handled;
        };
        if self.phase != Phase::Start {
            self.fail(Error::InitialTransitionOutsideStart {
                state: self.source().clone(),
                target,
            });
            return Response::Handled;
        }
        if target_idx == self.state || !self.hierarchy.is_ancestor_idx(self.state, target_idx) {
            self.fail(Error::NotASubstate {
                state: self.source().clone(),
                target,
            });
            return Response::Handled;
        }
        if !self.check_pending(&target) {
            return Response::Handled;
        }
        self.request = Some(Request::Initial { target: target_idx });
        Response::Handled
    }

    fn resolve(&mut self, target: &S) -> Option<usize> {
        match self.hierarchy.index_of(target) {
            Ok(idx) => Some(idx),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    fn check_pending(&mut self, requested: &S) -> bool {
        match self.request {
            Some(pending) => {
                self.fail(Error::TransitionPending {
                    pending: self.hierarchy.id(pending.target()).clone(),
                    requested: requested.clone(),
                });
                false
            }
            None => true,
        }
    }

    fn fail(&mut self, error: Error<S>) {
        if self.fault.is_none() {
            self.fault = Some(error);
        }
    }
}

/// One distinct transition taken by a machine, kept for diagram export.
#[cfg(all(feature = "plantuml", debug_assertions))]
#[derive(Debug, Clone)]
pub struct TransitionRecord<S> {
    /// State whose handler requested the transition
    pub from: S,
    /// Transition target
    pub to: S,
    /// `transition` or `initial`
    pub trigger: String,
    /// When the transition was last taken
    pub timestamp: SystemTime,
}

/// A hierarchical state machine instance.
pub struct StateMachine<S, CTX, E> {
    name: String,
    hierarchy: Hierarchy<S>,
    handlers: Vec<Box<dyn Stateful<S, CTX, E>>>,
    context: CTX,
    current: Option<usize>,
    unhandled: u64,

    // Transition log - only one record per unique state-to-state transition
    #[cfg(all(feature = "plantuml", debug_assertions))]
    transition_log: HashMap<(S, S), TransitionRecord<S>>,
}

impl<S, CTX, E> StateMachine<S, CTX, E>
where
    S: Clone + Debug + Eq + Hash,
    E: Debug,
{
    /// Create a machine from a validated hierarchy and one handler per state,
    /// in hierarchy order.
    pub(crate) fn new(
        name: String,
        hierarchy: Hierarchy<S>,
        handlers: Vec<Box<dyn Stateful<S, CTX, E>>>,
        context: CTX,
    ) -> Self {
        Self {
            name,
            hierarchy,
            handlers,
            context,
            current: None,
            unhandled: 0,

            #[cfg(all(feature = "plantuml", debug_assertions))]
            transition_log: HashMap::new(),
        }
    }

    /// Enter the top state and resolve initial transitions until the machine
    /// settles. Must be called exactly once, before any event.
    pub fn on_start(&mut self) -> Result<(), Error<S>> {
        if self.current.is_some() {
            return Err(Error::AlreadyStarted);
        }
        debug!(machine = %self.name, "starting");
        let top = 0;
        self.deliver(top, top, &Msg::Entry)?;
        self.current = Some(top);
        self.settle(top)
    }

    /// Deliver one event.
    ///
    /// The event is offered to the active state and then to each superstate
    /// until a handler consumes it. An event nobody consumes is dropped.
    pub fn on_event(&mut self, event: E) -> Result<(), Error<S>> {
        let active = self.current.ok_or(Error::StateMachineNotInitialized)?;
        let msg = Msg::Event(event);

        let mut cursor = Some(active);
        while let Some(source) = cursor {
            let (response, request) = self.deliver(source, active, &msg)?;
            match response {
                Response::Handled => {
                    if let Some(Request::Transition {
                        target,
                        exit_levels,
                    }) = request
                    {
                        self.execute_transition(active, source, target, exit_levels)?;
                    }
                    return Ok(());
                }
                Response::Super => {
                    if request.is_some() {
                        return Err(Error::DeclinedWithPendingTransition(
                            self.hierarchy.id(source).clone(),
                        ));
                    }
                    cursor = self.hierarchy.parent_idx(source);
                }
            }
        }

        self.unhandled += 1;
        debug!(
            machine = %self.name,
            state = self.hierarchy.name_of(active),
            event = ?msg,
            "event not handled, dropped"
        );
        Ok(())
    }

    /// Deliver an event by reference
    pub fn process_event(&mut self, event: &E) -> Result<(), Error<S>>
    where
        E: Clone,
    {
        self.on_event(event.clone())
    }

    /// Machine name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current state, `None` before `on_start`
    pub fn current_state(&self) -> Option<S> {
        self.current.map(|idx| self.hierarchy.id(idx).clone())
    }

    /// True if `state` is the active state or one of its superstates
    pub fn is_in(&self, state: &S) -> bool {
        match (self.current, self.hierarchy.index_of(state)) {
            (Some(current), Ok(idx)) => self.hierarchy.is_ancestor_idx(idx, current),
            _ => false,
        }
    }

    /// The machine's topology
    pub fn hierarchy(&self) -> &Hierarchy<S> {
        &self.hierarchy
    }

    /// Number of events dropped because no handler consumed them
    pub fn unhandled_events(&self) -> u64 {
        self.unhandled
    }

    /// Get a reference to the context
    pub fn context(&self) -> &CTX {
        &self.context
    }

    /// Get a mutable reference to the context
    pub fn context_mut(&mut self) -> &mut CTX {
        &mut self.context
    }

    fn deliver(
        &mut self,
        state: usize,
        current: usize,
        msg: &Msg<E>,
    ) -> Result<(Response, Option<Request>), Error<S>> {
        trace!(
            machine = %self.name,
            state = self.hierarchy.name_of(state),
            msg = ?msg,
            "deliver"
        );
        let mut hsm = Dispatch::new(&self.hierarchy, current, state, Phase::from(msg));
        let response = self.handlers[state].on_event(msg, &mut hsm, &mut self.context);
        match hsm.fault {
            Some(fault) => Err(fault),
            None => Ok((response, hsm.request)),
        }
    }

    /// Exit from `active` up to the LCA, enter down to `target`, then resolve
    /// `target`'s initial transitions.
    fn execute_transition(
        &mut self,
        active: usize,
        source: usize,
        target: usize,
        exit_levels: usize,
    ) -> Result<(), Error<S>> {
        // Both paths are traced before any action runs so a bad transition
        // leaves the machine where it was.
        let mut exits = self.hierarchy.path_up(active, source)?;
        let mut lca = Some(source);
        for _ in 0..exit_levels {
            let Some(state) = lca else { break };
            if exits.len() >= self.hierarchy.max_nesting() {
                return Err(Error::NestingExceeded {
                    from: self.hierarchy.id(active).clone(),
                    limit: self.hierarchy.max_nesting(),
                });
            }
            exits.push(state);
            lca = self.hierarchy.parent_idx(state);
        }
        let top = 0;
        let entries = match lca {
            Some(lca) => self.hierarchy.entry_path_idx(target, lca)?,
            // top itself was exited (self-transition of top)
            None => {
                let mut path = vec![top];
                path.extend(self.hierarchy.entry_path_idx(target, top)?);
                path
            }
        };
        let lca = lca.unwrap_or(top);

        debug!(
            machine = %self.name,
            from = self.hierarchy.name_of(source),
            to = self.hierarchy.name_of(target),
            exit_levels,
            "transition"
        );

        for state in exits {
            self.deliver(state, active, &Msg::Exit)?;
        }
        self.current = Some(lca);
        for state in entries {
            self.deliver(state, lca, &Msg::Entry)?;
        }
        self.current = Some(target);
        self.log_transition(source, target, "transition");

        self.settle(target)
    }

    /// Deliver START to the active state until no initial transition is
    /// requested.
    fn settle(&mut self, mut current: usize) -> Result<(), Error<S>> {
        for _ in 0..self.hierarchy.max_nesting() {
            let (_, request) = self.deliver(current, current, &Msg::Start)?;
            let Some(Request::Initial { target }) = request else {
                return Ok(());
            };

            debug!(
                machine = %self.name,
                from = self.hierarchy.name_of(current),
                to = self.hierarchy.name_of(target),
                "initial transition"
            );
            for state in self.hierarchy.entry_path_idx(target, current)? {
                self.deliver(state, current, &Msg::Entry)?;
            }
            self.log_transition(current, target, "initial");
            current = target;
            self.current = Some(current);
        }
        Err(Error::NestingExceeded {
            from: self.hierarchy.id(current).clone(),
            limit: self.hierarchy.max_nesting(),
        })
    }

    // Log a transition (only in debug builds with plantuml feature)
    #[cfg(all(feature = "plantuml", debug_assertions))]
    fn log_transition(&mut self, from: usize, to: usize, trigger: &str) {
        let from = self.hierarchy.id(from).clone();
        let to = self.hierarchy.id(to).clone();
        let record = TransitionRecord {
            from: from.clone(),
            to: to.clone(),
            trigger: trigger.to_string(),
            timestamp: SystemTime::now(),
        };
        self.transition_log.insert((from, to), record);
    }

    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    fn log_transition(&mut self, _from: usize, _to: usize, _trigger: &str) {}

    /// Export the hierarchy and every transition taken so far as a PlantUML
    /// state diagram.
    #[cfg(all(feature = "plantuml", debug_assertions))]
    pub fn export_plantuml(&self) -> String {
        let current = self.current.map(|idx| self.hierarchy.id(idx).clone());
        crate::plantuml::generate_plantuml(
            &self.hierarchy,
            self.transition_log.values(),
            current.as_ref(),
        )
    }

    /// Stub for export_plantuml when feature is disabled
    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    pub fn export_plantuml(&self) -> String {
        String::from("PlantUML export not available (requires 'plantuml' feature and debug build)")
    }
}
