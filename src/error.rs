//! Error types for the state machine

use thiserror::Error;

/// Result type alias for state machine operations
pub type Result<T, S> = std::result::Result<T, Error<S>>;

/// Errors that can occur while building or driving a state machine.
///
/// Every runtime variant signals a broken handler contract (a programming
/// error), never a recoverable condition. Events nobody handles are not
/// errors; they are dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error<S> {
    /// `on_event` was called before `on_start`
    #[error("State machine not initialized")]
    StateMachineNotInitialized,

    /// `on_start` was called more than once
    #[error("State machine already started")]
    AlreadyStarted,

    /// Attempted to use a state that wasn't registered with the builder
    #[error("State {0:?} not registered")]
    StateNotRegistered(S),

    /// The same state id was registered twice
    #[error("State {0:?} registered more than once")]
    DuplicateState(S),

    /// No top state was given to the builder
    #[error("No top state registered")]
    MissingTop,

    /// A state other than top has no superstate
    #[error("State {0:?} has no superstate")]
    OrphanState(S),

    /// A superstate points at a state that was never registered
    #[error("State {state:?} names unregistered superstate {superstate:?}")]
    UnknownSuperstate {
        /// The state being registered
        state: S,
        /// The missing superstate
        superstate: S,
    },

    /// Walking superstates from this state never reaches top
    #[error("State {0:?} is part of a superstate cycle")]
    CyclicHierarchy(S),

    /// The hierarchy is nested deeper than the configured limit
    #[error("State {state:?} is nested {depth} levels deep, limit is {limit}")]
    NestingTooDeep {
        /// Offending state
        state: S,
        /// Its depth, counting top as 1
        depth: usize,
        /// Configured nesting limit
        limit: usize,
    },

    /// An entry, exit or initial-transition path ran past the nesting limit
    #[error("Path from {from:?} exceeds nesting limit {limit}")]
    NestingExceeded {
        /// State the walk started at
        from: S,
        /// Configured nesting limit
        limit: usize,
    },

    /// A path walk reached the root without meeting the expected ancestor
    #[error("State {ancestor:?} is not an ancestor of {state:?}")]
    NotAnAncestor {
        /// State the walk started at
        state: S,
        /// Ancestor that was never met
        ancestor: S,
    },

    /// A second transition was requested before the first was consumed
    #[error("Transition to {requested:?} requested while transition to {pending:?} is pending")]
    TransitionPending {
        /// Target already pending
        pending: S,
        /// Target of the rejected request
        requested: S,
    },

    /// A regular transition was requested while handling a pseudo-event
    #[error("State {state:?} requested transition to {target:?} outside of a user event")]
    TransitionOutsideEvent {
        /// Requesting state
        state: S,
        /// Requested target
        target: S,
    },

    /// An initial transition was requested outside of a START delivery
    #[error("State {state:?} requested initial transition to {target:?} outside of START")]
    InitialTransitionOutsideStart {
        /// Requesting state
        state: S,
        /// Requested target
        target: S,
    },

    /// An initial transition must lead strictly deeper into the started state
    #[error("Initial transition target {target:?} is not a substate of {state:?}")]
    NotASubstate {
        /// State being started
        state: S,
        /// Requested target
        target: S,
    },

    /// A handler requested a transition and then declined the event
    #[error("State {0:?} declined an event after requesting a transition")]
    DeclinedWithPendingTransition(S),
}
