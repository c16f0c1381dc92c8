pub mod push;
pub mod store;
pub mod time;

pub use push::{PushSender, SendError};
pub use store::{StoreError, SubscriptionStore};
pub use time::TimeProvider;
