//! Campaign conversation state machine
//!
//! Elm Architecture: `transition` is pure, the runtime executes the effects
//! it returns and feeds their outcomes back in as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{DispatchOrigin, InputContext, Stage, TurnContext, TurnState};
pub use transition::transition;
