//! The Diameter result-code taxonomy used by this core (§7). Base
//! `Result-Code` values are plain; 3GPP experimental ones are always paired
//! with `Vendor-Id = 10415` inside an `Experimental-Result` grouped AVP
//! (§4 of every command handler).

pub const THREEGPP_VENDOR_ID: u32 = 10415;

// Base protocol (RFC 6733 §7.1).
pub const DIAMETER_SUCCESS: u32 = 2001;
pub const DIAMETER_COMMAND_UNSUPPORTED: u32 = 3001;
pub const DIAMETER_REALM_NOT_SERVED: u32 = 3003;
pub const DIAMETER_INVALID_AVP_VALUE: u32 = 5004;
pub const DIAMETER_MISSING_AVP: u32 = 5005;
pub const DIAMETER_UNABLE_TO_COMPLY: u32 = 5012;

// 3GPP experimental results (TS 29.272 §7.3), vendor-id 10415.
pub const DIAMETER_ERROR_USER_UNKNOWN: u32 = 5001;
pub const DIAMETER_ERROR_ROAMING_NOT_ALLOWED: u32 = 5004;
pub const DIAMETER_AUTHENTICATION_DATA_UNAVAILABLE: u32 = 4181;
pub const DIAMETER_ERROR_UNKNOWN_EPS_SUBSCRIPTION: u32 = 5420;
pub const DIAMETER_ERROR_RAT_NOT_ALLOWED: u32 = 5421;
pub const DIAMETER_ERROR_UNKOWN_SERVING_NODE: u32 = 5423;

/// `Error-Diagnostic` values attached to ROAMING_NOT_ALLOWED (§4.4 step 5),
/// one per `OdbSetting` the subscriber is barred under.
pub const ERROR_DIAGNOSTIC_ODB_ALL_APN: i32 = 2;
pub const ERROR_DIAGNOSTIC_ODB_HPLMN_APN: i32 = 3;
pub const ERROR_DIAGNOSTIC_ODB_VPLMN_APN: i32 = 4;
