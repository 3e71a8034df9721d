//! The S6a Home Subscriber Server: the four command state machines
//! (Authentication-Information, Update-Location, Purge-UE, Notify), the
//! subscriber store and metrics counter adapters they are built against, the
//! peer/transaction layer that routes inbound requests to them, and process
//! configuration.
//!
//! Everything in this module is specific to the HSS; [`crate::diameter`],
//! [`crate::avp`] and [`crate::dictionary`] are the reusable wire layer it is
//! built on.

pub mod config;
pub mod counters;
pub mod error;
pub mod handlers;
pub mod peer;
pub mod response;
pub mod result_code;
pub mod store;
pub mod subscriber;
pub mod subscription_data;

pub use config::Config;
pub use counters::Counters;
pub use error::HandlerError;
pub use store::SubscriberStore;
pub use subscriber::{Apn, Mip6, OdbSetting, PdnType, SrvccSupport, Subscriber};
