//! The Subscriber/APN/MIP6 value objects (§3) materialised by the
//! [`crate::hss::store::SubscriberStore`] adapter. The core never sees the
//! relational rows or their foreign keys directly; it only ever sees these
//! already-joined value objects.

use crate::error::{Error, Result};

/// Operator-Determined Barring setting (TS 29.272 §7.3.31).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdbSetting {
    None,
    AllApn,
    HplmnApn,
    VplmnApn,
}

/// Tri-state UE SRVCC support, as reported by `UE-SRVCC-Capability` on ULR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrvccSupport {
    True,
    False,
    Unknown,
}

/// The PDN type an APN hands out (TS 29.272 §7.3.62).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdnType {
    IPv4,
    IPv6,
    IPv4v6,
    IPv4orIPv6,
}

/// A dynamic P-GW binding for one APN context, populated by Notify (§4.6).
/// Created null (`destination_host`/`destination_realm` both `None`) and
/// stays null until a NOR names this `context_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mip6 {
    pub context_id: u32,
    pub service_selection: String,
    pub destination_realm: Option<String>,
    pub destination_host: Option<String>,
}

impl Mip6 {
    pub fn empty(context_id: u32, service_selection: impl Into<String>) -> Mip6 {
        Mip6 {
            context_id,
            service_selection: service_selection.into(),
            destination_realm: None,
            destination_host: None,
        }
    }

    /// Both halves of the dynamic binding are present.
    pub fn is_bound(&self) -> bool {
        self.destination_realm.is_some() && self.destination_host.is_some()
    }
}

/// An access-point profile (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apn {
    pub context_id: u32,
    pub apn_name: String,
    pub pdn_type: PdnType,
    pub qci: u32,
    pub priority_level: u32,
    pub max_req_bw_ul: u32,
    pub max_req_bw_dl: u32,
}

/// The root subscriber entity, keyed by IMSI (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub imsi: String,
    pub k: [u8; 16],
    pub opc: [u8; 16],
    pub amf: [u8; 2],
    pub sqn: [u8; 6],
    pub msisdn: String,
    pub stn_sr: Option<String>,
    pub roaming_allowed: bool,
    pub odb: OdbSetting,
    pub schar: u8,
    pub max_req_bw_ul: u32,
    pub max_req_bw_dl: u32,
    pub default_apn: u32,
    pub apns: Vec<Apn>,
    pub mip6: Vec<Mip6>,
    pub mme_hostname: String,
    pub mme_realm: String,
    pub ue_srvcc_support: SrvccSupport,
}

impl Subscriber {
    /// Validates the invariants of §3 that the core relies on: IMSI shape,
    /// `default_apn` membership, and a 1:1 APN/MIP6 pairing by `context_id`.
    /// The provisioning surface is expected to enforce these at write time;
    /// the core re-checks them defensively since it is the only other writer
    /// of this value object (via the store adapter).
    pub fn validate(&self) -> Result<()> {
        if self.imsi.len() != 15 || !self.imsi.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidValue(format!(
                "IMSI must be 15 decimal digits: {}",
                self.imsi
            )));
        }
        if !self.apns.iter().any(|a| a.context_id == self.default_apn) {
            return Err(Error::InvalidValue(
                "default_apn does not name an associated APN".into(),
            ));
        }
        for apn in &self.apns {
            let count = self
                .mip6
                .iter()
                .filter(|m| m.context_id == apn.context_id)
                .count();
            if count != 1 {
                return Err(Error::InvalidValue(format!(
                    "APN context {} must have exactly one MIP6 row, found {}",
                    apn.context_id, count
                )));
            }
        }
        Ok(())
    }

    pub fn apn(&self, context_id: u32) -> Option<&Apn> {
        self.apns.iter().find(|a| a.context_id == context_id)
    }

    pub fn mip6(&self, context_id: u32) -> Option<&Mip6> {
        self.mip6.iter().find(|m| m.context_id == context_id)
    }

    /// Whether the serving node has ever registered for this subscriber.
    pub fn has_registered_mme(&self) -> bool {
        !self.mme_hostname.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apn(context_id: u32) -> Apn {
        Apn {
            context_id,
            apn_name: "internet".into(),
            pdn_type: PdnType::IPv4v6,
            qci: 9,
            priority_level: 8,
            max_req_bw_ul: 50_000_000,
            max_req_bw_dl: 100_000_000,
        }
    }

    fn subscriber() -> Subscriber {
        Subscriber {
            imsi: "999000000000001".into(),
            k: [0; 16],
            opc: [0; 16],
            amf: [0; 2],
            sqn: [0; 6],
            msisdn: "447700900123".into(),
            stn_sr: None,
            roaming_allowed: true,
            odb: OdbSetting::None,
            schar: 8,
            max_req_bw_ul: 50_000_000,
            max_req_bw_dl: 100_000_000,
            default_apn: 1,
            apns: vec![apn(1)],
            mip6: vec![Mip6::empty(1, "internet")],
            mme_hostname: String::new(),
            mme_realm: String::new(),
            ue_srvcc_support: SrvccSupport::Unknown,
        }
    }

    #[test]
    fn test_valid_subscriber_passes() {
        assert!(subscriber().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_imsi_length() {
        let mut s = subscriber();
        s.imsi = "999000000000".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_default_apn_not_in_list() {
        let mut s = subscriber();
        s.default_apn = 99;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_apn_without_mip6_row() {
        let mut s = subscriber();
        s.mip6.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_has_registered_mme() {
        let mut s = subscriber();
        assert!(!s.has_registered_mme());
        s.mme_hostname = "mme1.example.com".into();
        assert!(s.has_registered_mme());
    }
}
