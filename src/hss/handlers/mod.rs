//! The four S6a command state machines (§4.3–§4.6). Each submodule owns one
//! command's `handle` entry point; this module holds the AVP-extraction
//! helpers shared by all four (IMSI, Visited-PLMN-Id), since every command
//! starts by pulling the same two fields off the request the same way.

pub mod air;
pub mod nor;
pub mod pur;
pub mod ulr;

use crate::avp::Avp;
use crate::diameter::DiameterMessage;
use crate::hss::error::HandlerError;

/// Extracts and validates `User-Name` (IMSI) per §4.3 step 1, shared by every
/// command handler.
pub fn extract_imsi(req: &DiameterMessage) -> Result<String, HandlerError> {
    let avp = req
        .get_avp_by_name("user_name")
        .expect("user_name is a registered dictionary AVP");
    let avp = avp.ok_or_else(|| HandlerError::missing("User-Name AVP not found"))?;
    let imsi = avp.get_utf8string().unwrap_or_default().to_string();
    if imsi.len() != 15 || !imsi.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HandlerError::invalid_value(
            "User-Name AVP has invalid value",
            avp.clone(),
        ));
    }
    Ok(imsi)
}

/// Extracts `Visited-PLMN-Id` per §4.3 step 2, shared by every command
/// handler that needs it.
pub fn extract_visited_plmn(req: &DiameterMessage) -> Result<[u8; 3], HandlerError> {
    let avp = req
        .get_avp_by_name("visited_plmn_id")
        .expect("visited_plmn_id is a registered dictionary AVP");
    let avp = avp.ok_or_else(|| HandlerError::missing("Visited-PLMN-Id AVP not found"))?;
    let bytes = avp.get_octetstring().unwrap_or_default();
    bytes.try_into().map_err(|_| {
        HandlerError::invalid_value("Visited-PLMN-Id AVP has invalid value", avp.clone())
    })
}

/// Looks an identity-typed AVP (`Origin-Host`, `Destination-Realm`, ...) up
/// by dictionary name, returning an owned `String`.
pub fn get_identity(req: &DiameterMessage, name: &str) -> Option<String> {
    req.get_avp_by_name(name)
        .expect("registered dictionary AVP")
        .map(|avp| avp.get_identity().unwrap_or_default().into_owned())
}

pub fn get_avp_owned(req: &DiameterMessage, name: &str) -> Option<Avp> {
    req.get_avp_by_name(name)
        .expect("registered dictionary AVP")
        .cloned()
}
