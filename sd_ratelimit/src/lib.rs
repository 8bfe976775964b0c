//! Sliding-window admission limiter for rate-limited payload dispatch
//!
//! At most `capacity` dispatches are admitted within any trailing window of
//! `window` duration. Excess callers block (they are never rejected) until the
//! window rolls past an earlier admission. The actual downstream delivery is
//! performed by a caller-supplied [`Dispatcher`]; the limiter only decides when
//! that delivery may run.

pub mod dispatch;
pub mod error;
pub mod sliding_window;

pub use dispatch::DispatchFuture;
pub use dispatch::Dispatcher;
pub use error::AdmitError;
pub use error::RateLimitError;
pub use error::Result;
pub use sliding_window::SlidingWindow;
pub use sliding_window::SlidingWindowBuilder;
