//! Client-side coordination loops for the TAGUATO-SEND panel.
//!
//! - [`BulkDispatcher`] sends one message to many recipients, one at a
//!   time with a fixed throttle, reporting progress after every step
//!   and honouring cooperative cancellation.
//! - [`ConnectionWatcher`] polls an instance's connection state until
//!   it pairs, the attempt budget runs out, or the watch is stopped.
//!
//! Both are written against the collaborator traits in
//! [`taguato_core::transport`] and share no state with each other.

pub mod bulk;
pub mod outcome;
pub mod progress;
pub mod watcher;

pub use bulk::{BulkDispatcher, DispatchConfig, DispatchError};
pub use outcome::{retryable_recipients, DispatchOutcome, DispatchSummary, OutcomeState};
pub use progress::{ChannelProgressSink, DispatchProgress, ProgressSink};
pub use watcher::{ConnectionWatcher, WatchConfig, WatchHandle, WatchState};
