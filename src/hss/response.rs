//! The response builder (§4 "Response builder"): constructs well-formed
//! answers for every error and success class the command handlers need,
//! attaching the mandatory preamble (`Vendor-Specific-Application-Id`,
//! `Auth-Session-State`, `Origin-Host`, `Origin-Realm`, `Session-Id`) once so
//! no handler has to repeat it.

use crate::avp;
use crate::avp::flags::M;
use crate::avp::{Avp, Enumerated, Grouped, Identity, Unsigned32, UTF8String};
use crate::diameter::DiameterMessage;
use crate::hss::result_code::{self, THREEGPP_VENDOR_ID};
use std::sync::Arc;

/// `Auth-Session-State` value this HSS always answers with: S6a is
/// stateless from the HSS's point of view (TS 29.272 has no session
/// teardown for AIR/ULR/PUR/NOR).
const NO_STATE_MAINTAINED: i32 = 1;

const S6A_APPLICATION_ID: u32 = 16777251;

/// Builds the answer preamble common to every S6a command: the answer
/// envelope from [`DiameterMessage::new_answer`], `Session-Id` echoed from
/// the request, `Vendor-Specific-Application-Id`, `Auth-Session-State`, and
/// `Origin-Host`/`Origin-Realm` naming this node.
pub fn preamble(req: &DiameterMessage, origin_host: &str, origin_realm: &str) -> DiameterMessage {
    let mut ans = DiameterMessage::new_answer(req);
    let dict = ans.dictionary();

    if let Ok(Some(session_id)) = req.get_avp_by_name("session_id") {
        if let Some(s) = session_id.get_utf8string() {
            ans.add_avp(avp!(263, None, M, UTF8String::new(s)));
        }
    }

    let mut vsai = Grouped::new(vec![], Arc::clone(&dict));
    vsai.add_avp(266, None, M, Unsigned32::new(THREEGPP_VENDOR_ID).into());
    vsai.add_avp(258, None, M, Unsigned32::new(S6A_APPLICATION_ID).into());
    ans.add_avp(avp!(260, None, M, vsai));

    ans.add_avp(avp!(277, None, M, Enumerated::new(NO_STATE_MAINTAINED)));
    ans.add_avp(avp!(264, None, M, Identity::new(origin_host)));
    ans.add_avp(avp!(296, None, M, Identity::new(origin_realm)));
    ans
}

/// Wraps `offending` in a `Failed-AVP` (279) grouped AVP, as attached to
/// MISSING_AVP/INVALID_AVP_VALUE answers (§7).
fn failed_avp(dict: &Arc<crate::dictionary::Dictionary>, offending: Avp) -> Grouped {
    let mut g = Grouped::new(vec![], Arc::clone(dict));
    g.add(offending);
    g
}

/// DIAMETER_SUCCESS (2001), preamble only — the caller attaches whatever
/// command-specific payload (e.g. `Subscription-Data`) the success case
/// carries.
pub fn success(req: &DiameterMessage, origin_host: &str, origin_realm: &str) -> DiameterMessage {
    let mut ans = preamble(req, origin_host, origin_realm);
    ans.add_avp(avp!(268, None, M, Unsigned32::new(result_code::DIAMETER_SUCCESS)));
    ans
}

/// DIAMETER_MISSING_AVP (5005), with an `Error-Message` and, when the
/// condition was "enclosing grouped AVP present but incomplete", a
/// `Failed-AVP` wrapping it (§4.3 step 3, §4.6 step 4).
pub fn missing_avp(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    message: &str,
    failed: Option<Avp>,
) -> DiameterMessage {
    let mut ans = preamble(req, origin_host, origin_realm);
    let dict = ans.dictionary();
    ans.add_avp(avp!(268, None, M, Unsigned32::new(result_code::DIAMETER_MISSING_AVP)));
    ans.add_avp(avp!(281, None, M, UTF8String::new(message)));
    if let Some(offending) = failed {
        ans.add_avp(avp!(279, None, M, failed_avp(&dict, offending)));
    }
    ans
}

/// DIAMETER_INVALID_AVP_VALUE (5004), with `Error-Message` and a mandatory
/// `Failed-AVP` wrapping the offending AVP (§4.3 step 1).
pub fn invalid_avp_value(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    message: &str,
    failed: Avp,
) -> DiameterMessage {
    let mut ans = preamble(req, origin_host, origin_realm);
    let dict = ans.dictionary();
    ans.add_avp(avp!(
        268,
        None,
        M,
        Unsigned32::new(result_code::DIAMETER_INVALID_AVP_VALUE)
    ));
    ans.add_avp(avp!(281, None, M, UTF8String::new(message)));
    ans.add_avp(avp!(279, None, M, failed_avp(&dict, failed)));
    ans
}

/// DIAMETER_REALM_NOT_SERVED (3003), with an `Error-Message` explaining the
/// required realm form (§4.4 step 5).
pub fn realm_not_served(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    message: &str,
) -> DiameterMessage {
    let mut ans = preamble(req, origin_host, origin_realm);
    ans.add_avp(avp!(
        268,
        None,
        M,
        Unsigned32::new(result_code::DIAMETER_REALM_NOT_SERVED)
    ));
    ans.add_avp(avp!(281, None, M, UTF8String::new(message)));
    ans
}

/// DIAMETER_UNABLE_TO_COMPLY (5012), the catch-all for an internal failure a
/// handler could not turn into a more specific answer (§7).
pub fn unable_to_comply(req: &DiameterMessage, origin_host: &str, origin_realm: &str) -> DiameterMessage {
    let mut ans = preamble(req, origin_host, origin_realm);
    ans.add_avp(avp!(
        268,
        None,
        M,
        Unsigned32::new(result_code::DIAMETER_UNABLE_TO_COMPLY)
    ));
    ans
}

/// A 3GPP experimental result: `Experimental-Result` grouped AVP containing
/// `Vendor-Id = 10415` and `Experimental-Result-Code = code` (§7).
pub fn experimental_result(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    code: u32,
) -> DiameterMessage {
    experimental_result_with_diagnostic(req, origin_host, origin_realm, code, None)
}

/// As [`experimental_result`], plus an `Error-Diagnostic` AVP (§4.4 step 5).
pub fn experimental_result_with_diagnostic(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    code: u32,
    diagnostic: Option<i32>,
) -> DiameterMessage {
    let mut ans = preamble(req, origin_host, origin_realm);
    let dict = ans.dictionary();
    let mut er = Grouped::new(vec![], Arc::clone(&dict));
    er.add_avp(266, None, M, Unsigned32::new(THREEGPP_VENDOR_ID).into());
    er.add_avp(298, None, M, Unsigned32::new(code).into());
    ans.add_avp(avp!(297, None, M, er));
    if let Some(diag) = diagnostic {
        ans.add_avp(avp!(2103, Some(THREEGPP_VENDOR_ID), M, Enumerated::new(diag)));
    }
    ans
}

/// As [`experimental_result`], plus an `Error-Message` and a `Failed-AVP`
/// wrapping `failed` (§4.3 step 5 — DIAMETER_AUTHENTICATION_DATA_UNAVAILABLE
/// is a 3GPP experimental result but, unlike the others, also carries a
/// failed-AVP and message like a base MISSING_AVP/INVALID_AVP_VALUE answer).
pub fn experimental_result_with_failed_avp(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    code: u32,
    message: &str,
    failed: Avp,
) -> DiameterMessage {
    let mut ans = experimental_result(req, origin_host, origin_realm, code);
    let dict = ans.dictionary();
    ans.add_avp(avp!(281, None, M, UTF8String::new(message)));
    ans.add_avp(avp!(279, None, M, failed_avp(&dict, failed)));
    ans
}

/// Turns a [`crate::hss::HandlerError`] into the corresponding answer.
pub fn from_handler_error(
    req: &DiameterMessage,
    origin_host: &str,
    origin_realm: &str,
    err: crate::hss::HandlerError,
) -> DiameterMessage {
    use crate::hss::HandlerError;
    match err {
        HandlerError::MissingAvp { message, failed_avp } => {
            missing_avp(req, origin_host, origin_realm, &message, failed_avp)
        }
        HandlerError::InvalidAvpValue { message, failed_avp } => {
            invalid_avp_value(req, origin_host, origin_realm, &message, failed_avp)
        }
    }
}

