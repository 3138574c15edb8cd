//! Gateway limits and pacing constants.
//!
//! These mirror the limits the gateway enforces server-side; sending
//! faster or larger batches only earns rate-limit rejections.

use std::time::Duration;

/// Maximum number of recipients accepted by a single bulk dispatch.
pub const MAX_RECIPIENTS: usize = 500;

/// Pause between two consecutive bulk sends.
pub const SEND_DELAY: Duration = Duration::from_millis(500);

/// Interval between two pairing status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Poll budget for one pairing watch (about two minutes at the default interval).
pub const MAX_POLL_ATTEMPTS: u32 = 40;
