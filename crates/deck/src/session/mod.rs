//! Daily session state machine and its observable surface

mod engine;
mod observable;
mod view;

pub use engine::{ActionOutcome, LOAD_FAILED_MESSAGE, SessionEngine};
pub use observable::{Observable, SubscriptionId};
pub use view::SessionView;
