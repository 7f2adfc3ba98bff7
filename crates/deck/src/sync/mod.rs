//! Offline delivery and background scheduling
//!
//! Actions that could not reach the remote are queued durably and delivered
//! later by a background loop. Delivery is at-least-once and in order.

mod background;
mod connectivity;
mod queue;
mod timing;

pub use background::{BackgroundSchedule, BackgroundTasks};
pub use connectivity::{Connectivity, ConnectivityFlag};
pub use queue::{FlushReport, OfflineActionQueue};
pub use timing::{BackoffPolicy, format_countdown, today, until_next_reset};
