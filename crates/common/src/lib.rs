pub mod clock;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use types::{InvalidOrderId, OrderId};
