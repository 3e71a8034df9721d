//! PLMN-Id encoding (TS 24.008 §10.5.1.3) and the 3GPP `mncNNN.mccNNN.3gppnetwork.org`
//! realm form (TS 23.003 §19.2) used to test whether a peer's origin realm
//! names a PLMN distinct from the subscriber's home network (§4.4 roaming test).

use crate::error::{Error, Result};

/// Encodes an (MCC, MNC) pair into the 3-byte TBCD PLMN-Id. A 2-digit MNC is
/// padded with a `1111` filler nibble in the position TS 24.008 reserves for
/// the MNC's third digit.
pub fn encode(mcc: u16, mnc: u16) -> Result<[u8; 3]> {
    if !(100..=999).contains(&mcc) {
        return Err(Error::EncodeError(format!("invalid MCC: {}", mcc)));
    }
    if !(1..=999).contains(&mnc) {
        return Err(Error::EncodeError(format!("invalid MNC: {}", mnc)));
    }

    let mcc_digits = [mcc / 100 % 10, mcc / 10 % 10, mcc % 10];
    let (mnc_d1, mnc_d2, mnc_d3) = if mnc >= 100 {
        (mnc / 100 % 10, mnc / 10 % 10, mnc % 10)
    } else {
        (mnc / 10 % 10, mnc % 10, 0xf)
    };

    Ok([
        (mcc_digits[1] << 4 | mcc_digits[0]) as u8,
        (mnc_d3 << 4 | mcc_digits[2]) as u8,
        (mnc_d2 << 4 | mnc_d1) as u8,
    ])
}

/// Decodes a 3-byte TBCD PLMN-Id back into (MCC, MNC).
pub fn decode(plmn: &[u8; 3]) -> Result<(u16, u16)> {
    let mcc_d1 = plmn[0] & 0x0f;
    let mcc_d2 = plmn[0] >> 4;
    let mcc_d3 = plmn[1] & 0x0f;
    let mnc_d3 = plmn[1] >> 4;
    let mnc_d1 = plmn[2] & 0x0f;
    let mnc_d2 = plmn[2] >> 4;

    if mcc_d1 > 9 || mcc_d2 > 9 || mcc_d3 > 9 || mnc_d1 > 9 || mnc_d2 > 9 {
        return Err(Error::DecodeError("invalid TBCD digit in PLMN-Id".into()));
    }

    let mcc = mcc_d1 as u16 * 100 + mcc_d2 as u16 * 10 + mcc_d3 as u16;
    let mnc = if mnc_d3 == 0xf {
        mnc_d1 as u16 * 10 + mnc_d2 as u16
    } else if mnc_d3 <= 9 {
        mnc_d1 as u16 * 100 + mnc_d2 as u16 * 10 + mnc_d3 as u16
    } else {
        return Err(Error::DecodeError("invalid TBCD digit in PLMN-Id".into()));
    };

    Ok((mcc, mnc))
}

/// Recognises the 3GPP realm form `...mncNNN.mccNNN.3gppnetwork.org`
/// (TS 23.003 §19.2), returning the (MCC, MNC) it names. `mncNNN` must be
/// exactly 3 digits (the form always zero-pads a 2-digit MNC); `mccNNN` must
/// be exactly 3 digits.
pub fn parse_3gpp_realm(realm: &str) -> Option<(u16, u16)> {
    let lower = realm.to_ascii_lowercase();
    let mut mnc_part = None;
    let mut mcc_part = None;

    for label in lower.split('.') {
        if let Some(digits) = label.strip_prefix("mnc") {
            if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) {
                mnc_part = digits.parse::<u16>().ok();
            }
        } else if let Some(digits) = label.strip_prefix("mcc") {
            if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) {
                mcc_part = digits.parse::<u16>().ok();
            }
        }
    }

    if !lower.ends_with("3gppnetwork.org") {
        return None;
    }

    match (mcc_part, mnc_part) {
        (Some(mcc), Some(mnc)) if mcc >= 100 => Some((mcc, mnc)),
        _ => None,
    }
}

/// Returns true iff `realm` is in the 3GPP realm form.
pub fn is_3gpp_realm(realm: &str) -> bool {
    parse_3gpp_realm(realm).is_some()
}
