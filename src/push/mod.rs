//! Push gateway client: the consumer of the provider token.

pub mod client;
pub mod error;
pub mod notification;
pub mod response;

pub use client::PushClient;
pub use error::PushError;
pub use notification::{Notification, Priority, PushType};
pub use response::PushResponse;
