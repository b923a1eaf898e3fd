pub mod decimal_utils;
pub mod time_utils;
pub mod user_locks;

pub use time_utils::{Clock, FixedClock, SystemClock};
pub use user_locks::UserLocks;
