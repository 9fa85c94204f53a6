//! Feeding a machine from a tokio channel.
//!
//! The pump owns the machine for as long as it runs and delivers queued events
//! one at a time, each to completion, so handlers never see re-entrant calls.

use std::fmt::Debug;
use std::hash::Hash;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{Error, StateMachine};

/// Start `machine` if needed, then process events until the channel closes.
pub async fn run<S, CTX, E>(
    machine: &mut StateMachine<S, CTX, E>,
    mut events: mpsc::Receiver<E>,
) -> Result<(), Error<S>>
where
    S: Clone + Debug + Eq + Hash,
    E: Debug,
{
    if machine.current_state().is_none() {
        machine.on_start()?;
    }
    while let Some(event) = events.recv().await {
        machine.on_event(event)?;
    }
    debug!(machine = machine.name(), "event channel closed");
    Ok(())
}

/// Move `machine` onto its own task and return the sending half of its queue.
///
/// The task ends when every sender is dropped or a handler breaks its
/// contract; it hands the machine back on success.
pub fn spawn<S, CTX, E>(
    mut machine: StateMachine<S, CTX, E>,
    capacity: usize,
) -> (mpsc::Sender<E>, JoinHandle<Result<StateMachine<S, CTX, E>, Error<S>>>)
where
    S: Clone + Debug + Eq + Hash + Send + 'static,
    CTX: Send + 'static,
    E: Debug + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(async move {
        run(&mut machine, rx).await?;
        Ok(machine)
    });
    (tx, handle)
}
