//! Payment record model and stores.

pub mod memory;
pub mod postgres;
pub mod record;
pub mod status;
pub mod store;

pub use memory::InMemoryPaymentStore;
pub use postgres::PostgresPaymentStore;
pub use record::{OrderDetails, OrderFields, OrderPaymentData};
pub use status::PaymentStatus;
pub use store::PaymentStore;
