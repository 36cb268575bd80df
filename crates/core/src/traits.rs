//! State machine trait.

use crate::{Action, Event};

/// The composed, deterministic protocol state machine.
///
/// Implementations mutate internal state and return actions, but never
/// perform I/O. The runner owns the loop:
///
/// ```text
/// loop {
///     let event = next_event();
///     for action in machine.handle(event) {
///         execute(action); // may enqueue further events
///     }
/// }
/// ```
pub trait StateMachine {
    fn handle(&mut self, event: Event) -> Vec<Action>;
}
