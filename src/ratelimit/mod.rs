//! Rate limiting logic and state management.

mod dimension;
mod janitor;
mod limiter;
mod policy;
mod window;

pub use dimension::Dimension;
pub use janitor::Janitor;
pub use limiter::{RateLimiter, SweepReport};
pub use policy::{TimeUnit, WindowPolicy};
pub use window::{SlidingWindowCounter, SweepStats};
