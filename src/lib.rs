//! # Hierarchical State Machine Engine
//!
//! A small, synchronous hierarchical state machine (HSM) runtime in Rust with
//! UML-statechart semantics: nested states, entry/exit actions, initial
//! transitions and transitions that exit exactly up to the least common
//! ancestor of source and target.
//!
//! ## Features
//!
//! - 🏗️ **Hierarchical States**: every state is potentially composite; events climb toward the top state until handled
//! - 🚪 **Entry/Exit/Start pseudo-events**: entry and exit actions and initial transitions live in the state's own handler
//! - 🎯 **LCA Transitions**: exit levels are precomputed once per hierarchy, self-transitions exit and re-enter
//! - 🛡️ **Checked Invariants**: bounded nesting, no cycles, one pending transition at a time
//! - 📊 **PlantUML Export**: state diagram generation (debug builds only)
//! - ⏩ **Tokio Pump**: optional channel-driven event loop
//!
//! ## Quick Start
//!
//! ```rust
//! use hsm_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum State { Top, Off, On }
//!
//! #[derive(Debug, Clone, Copy)]
//! enum Event { Toggle }
//!
//! struct Lamp(State);
//!
//! impl Stateful<State, u32, Event> for Lamp {
//!     fn on_event(&mut self, msg: &Msg<Event>, hsm: &mut Dispatch<'_, State>, switched: &mut u32) -> Response {
//!         match (self.0, msg) {
//!             (State::Top, Msg::Start) => hsm.start(State::Off),
//!             (State::On, Msg::Entry) => {
//!                 *switched += 1;
//!                 Response::Handled
//!             }
//!             (State::Off, Msg::Event(Event::Toggle)) => hsm.transition(State::On),
//!             (State::On, Msg::Event(Event::Toggle)) => hsm.transition(State::Off),
//!             _ => Response::Super,
//!         }
//!     }
//! }
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut fsm = StateMachineBuilder::new("lamp", 0)
//!     .top(State::Top, Lamp(State::Top))
//!     .state(State::Off, Lamp(State::Off))
//!     .state(State::On, Lamp(State::On))
//!     .superstate_fn(|_| Some(State::Top))
//!     .build()?;
//!
//! fsm.on_start()?;
//! fsm.on_event(Event::Toggle)?;
//! assert_eq!(fsm.current_state(), Some(State::On));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Handler contract
//!
//! - Return [`Response::Handled`] when the message is consumed and
//!   [`Response::Super`] to let the superstate see it. Events nobody consumes
//!   are dropped.
//! - Request at most one transition per delivery, and only while handling a
//!   user event ([`Dispatch::transition`]) or `Start` ([`Dispatch::start`]).
//! - Never call back into the machine from a handler.
//! - History is the application's business: keep the last active substate in
//!   the context (for example on `Exit`, via [`Dispatch::current`]) and
//!   return to it from `Start`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod builder;
mod error;
mod fsm;
pub mod hierarchy;

#[cfg(all(feature = "plantuml", debug_assertions))]
mod plantuml;

#[cfg(feature = "tokio-integration")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio-integration")))]
pub mod pump;

pub use builder::StateMachineBuilder;
pub use error::{Error, Result};
pub use fsm::{
    Dispatch, EventCode, Msg, Response, Signal, StateMachine, Stateful, ENTRY_EVT, EXIT_EVT,
    START_EVT,
};
pub use hierarchy::{Hierarchy, DEFAULT_MAX_NESTING};

#[cfg(all(feature = "plantuml", debug_assertions))]
pub use fsm::TransitionRecord;

pub mod prelude {
    //! Prelude module for convenient imports
    pub use crate::{
        Dispatch, Error, Msg, Response, Signal, StateMachine, StateMachineBuilder, Stateful,
    };
}
