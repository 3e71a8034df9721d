//! # HSS
//!
//! A 4G/LTE Home Subscriber Server, terminating the 3GPP S6a/S6d reference
//! point over the Diameter base protocol (RFC 6733) and the S6a application
//! (TS 29.272).
//!
//! ## Layout
//! * [`diameter`] / [`avp`] / [`dictionary`] - the wire codec: message
//!   framing, AVP encoding, and the name-keyed AVP dictionary.
//! * [`transport`] - the Diameter peer transport (TCP, optional TLS).
//! * [`milenage`] - the TS 35.206 authentication-vector generator.
//! * [`plmn`] - PLMN-Id / 3GPP realm encoding.
//! * [`hss`] - the S6a command handlers (AIR, ULR, PUR, NOR), the peer and
//!   transaction layer, the subscriber store and metrics counter adapters,
//!   and process configuration.

pub mod avp;
mod display;
pub mod diameter;
pub mod dictionary;
pub mod error;
pub mod hss;
pub mod milenage;
pub mod plmn;
pub mod tbcd;
pub mod transport;

pub use crate::diameter::flags;
pub use crate::diameter::{ApplicationId, CommandCode, DiameterHeader, DiameterMessage};
pub use crate::error::{Error, Result};
