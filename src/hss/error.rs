//! `HandlerError` models the "missing AVP" / "invalid value" control flow
//! the distilled spec's algorithms describe (§4, §7) as a typed `Result::Err`
//! rather than an exception, distinct from the wire-level [`crate::Error`]
//! the codec raises on a malformed message. A handler catches these from the
//! AVP-extraction helpers in [`crate::hss::handlers`] and turns them into an
//! answer via [`crate::hss::response`]; it never surfaces one to the peer.

use crate::avp::Avp;

/// An AVP extraction problem a command handler must turn into an answer.
#[derive(Debug)]
pub enum HandlerError {
    /// An expected AVP was absent. `failed_avp`, when present, is the
    /// enclosing grouped AVP that was found but incomplete (§4.3 step 3,
    /// §4.6 step 4).
    MissingAvp {
        message: String,
        failed_avp: Option<Avp>,
    },
    /// An AVP was present but failed a value check (length, range, enum
    /// membership). `failed_avp` is the offending AVP itself.
    InvalidAvpValue { message: String, failed_avp: Avp },
}

impl HandlerError {
    pub fn missing(message: impl Into<String>) -> HandlerError {
        HandlerError::MissingAvp {
            message: message.into(),
            failed_avp: None,
        }
    }

    pub fn missing_with_failed(message: impl Into<String>, failed_avp: Avp) -> HandlerError {
        HandlerError::MissingAvp {
            message: message.into(),
            failed_avp: Some(failed_avp),
        }
    }

    pub fn invalid_value(message: impl Into<String>, failed_avp: Avp) -> HandlerError {
        HandlerError::InvalidAvpValue {
            message: message.into(),
            failed_avp,
        }
    }
}
