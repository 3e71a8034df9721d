//! The Subscription-Data builder (§4.8): assembles the grouped
//! `subscription_data` AVP Update-Location's success answer carries, joining
//! the subscriber's MSISDN/ODB/charging fields with one `apn_configuration`
//! per associated APN/MIP6 pair.

use crate::avp::{Enumerated, Grouped, Identity, OctetString, UTF8String, Unsigned32};
use crate::dictionary::Dictionary;
use crate::hss::subscriber::{Mip6, OdbSetting, PdnType, Subscriber};
use crate::tbcd;
use std::sync::Arc;

const SUBSCRIBER_STATUS_SERVICE_GRANTED: i32 = 0;
const SUBSCRIBER_STATUS_OPERATOR_DETERMINED_BARRING: i32 = 1;

const ODB_BARRING_ALL_APN: u32 = 1 << 0;
const ODB_BARRING_HPLMN_APN: u32 = 1 << 1;
const ODB_BARRING_VPLMN_APN: u32 = 1 << 2;

const PDN_TYPE_IPV4: i32 = 0;
const PDN_TYPE_IPV6: i32 = 1;
const PDN_TYPE_IPV4V6: i32 = 2;
const PDN_TYPE_IPV4_OR_IPV6: i32 = 3;

const VPLMN_DYNAMIC_ADDRESS_NOT_ALLOWED: i32 = 0;
const PDN_GW_ALLOCATION_TYPE_DYNAMIC: i32 = 1;

const ALL_APN_CONFIGURATIONS_INCLUDED: i32 = 0;

fn pdn_type_code(pdn_type: PdnType) -> i32 {
    match pdn_type {
        PdnType::IPv4 => PDN_TYPE_IPV4,
        PdnType::IPv6 => PDN_TYPE_IPV6,
        PdnType::IPv4v6 => PDN_TYPE_IPV4V6,
        PdnType::IPv4orIPv6 => PDN_TYPE_IPV4_OR_IPV6,
    }
}

fn odb_barring_bit(odb: OdbSetting) -> Option<u32> {
    match odb {
        OdbSetting::None => None,
        OdbSetting::AllApn => Some(ODB_BARRING_ALL_APN),
        OdbSetting::HplmnApn => Some(ODB_BARRING_HPLMN_APN),
        OdbSetting::VplmnApn => Some(ODB_BARRING_VPLMN_APN),
    }
}

fn build_ambr(dict: &Arc<Dictionary>, ul: u32, dl: u32) -> Grouped {
    let mut ambr = Grouped::new(vec![], Arc::clone(dict));
    ambr.add_avp(516, None, crate::avp::flags::M, Unsigned32::new(ul).into());
    ambr.add_avp(515, None, crate::avp::flags::M, Unsigned32::new(dl).into());
    ambr
}

fn build_mip6_agent_info(dict: &Arc<Dictionary>, mip6: &Mip6) -> Grouped {
    let mut home_agent_host = Grouped::new(vec![], Arc::clone(dict));
    home_agent_host.add_avp(
        283,
        None,
        crate::avp::flags::M,
        Identity::new(mip6.destination_realm.as_deref().unwrap_or_default()).into(),
    );
    home_agent_host.add_avp(
        293,
        None,
        crate::avp::flags::M,
        Identity::new(mip6.destination_host.as_deref().unwrap_or_default()).into(),
    );
    let mut agent_info = Grouped::new(vec![], Arc::clone(dict));
    agent_info.add_avp(348, None, crate::avp::flags::M, crate::avp::AvpValue::Grouped(home_agent_host));
    agent_info
}

fn build_apn_configuration(dict: &Arc<Dictionary>, subscriber: &Subscriber, context_id: u32) -> Option<Grouped> {
    let apn = subscriber.apn(context_id)?;
    let mip6 = subscriber.mip6(context_id);
    let vendor = Some(crate::hss::result_code::THREEGPP_VENDOR_ID);

    let mut qos = Grouped::new(vec![], Arc::clone(dict));
    qos.add_avp(1028, vendor, crate::avp::flags::M, Enumerated::new(apn.qci as i32).into());
    let mut arp = Grouped::new(vec![], Arc::clone(dict));
    arp.add_avp(1046, vendor, crate::avp::flags::M, Unsigned32::new(apn.priority_level).into());
    qos.add_avp(1034, vendor, crate::avp::flags::M, crate::avp::AvpValue::Grouped(arp));

    let mut cfg = Grouped::new(vec![], Arc::clone(dict));
    cfg.add_avp(1423, vendor, crate::avp::flags::M, Unsigned32::new(apn.context_id).into());
    cfg.add_avp(493, None, crate::avp::flags::M, UTF8String::new(apn.apn_name.clone()).into());
    cfg.add_avp(1456, vendor, crate::avp::flags::M, Enumerated::new(pdn_type_code(apn.pdn_type)).into());
    cfg.add_avp(1431, vendor, crate::avp::flags::M, crate::avp::AvpValue::Grouped(qos));
    cfg.add_avp(
        1435,
        vendor,
        crate::avp::flags::M,
        crate::avp::AvpValue::Grouped(build_ambr(dict, apn.max_req_bw_ul, apn.max_req_bw_dl)),
    );
    cfg.add_avp(
        1432,
        vendor,
        crate::avp::flags::M,
        Enumerated::new(VPLMN_DYNAMIC_ADDRESS_NOT_ALLOWED).into(),
    );

    if let Some(mip6) = mip6 {
        if mip6.is_bound() {
            cfg.add_avp(
                1438,
                vendor,
                crate::avp::flags::M,
                Enumerated::new(PDN_GW_ALLOCATION_TYPE_DYNAMIC).into(),
            );
            cfg.add_avp(
                486,
                None,
                crate::avp::flags::M,
                crate::avp::AvpValue::Grouped(build_mip6_agent_info(dict, mip6)),
            );
        }
    }

    Some(cfg)
}

/// Builds the `subscription_data` (1400) grouped AVP for `subscriber`.
pub fn build(dict: &Arc<Dictionary>, subscriber: &Subscriber) -> Grouped {
    let mut data = Grouped::new(vec![], Arc::clone(dict));

    data.add_avp(
        701,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        OctetString::new(tbcd::encode(&subscriber.msisdn).unwrap_or_default()).into(),
    );
    if let Some(stn_sr) = &subscriber.stn_sr {
        data.add_avp(
            1433,
            Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
            crate::avp::flags::M,
            OctetString::new(tbcd::encode(stn_sr).unwrap_or_default()).into(),
        );
    }
    let subscriber_status = if subscriber.odb == OdbSetting::None {
        SUBSCRIBER_STATUS_SERVICE_GRANTED
    } else {
        SUBSCRIBER_STATUS_OPERATOR_DETERMINED_BARRING
    };
    data.add_avp(
        1424,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        Enumerated::new(subscriber_status).into(),
    );
    if let Some(bit) = odb_barring_bit(subscriber.odb) {
        data.add_avp(
            1425,
            Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
            crate::avp::flags::M,
            Unsigned32::new(bit).into(),
        );
    }
    data.add_avp(
        13,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        OctetString::new(format!("{:02X}00", subscriber.schar).into_bytes()).into(),
    );
    data.add_avp(
        1435,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        crate::avp::AvpValue::Grouped(build_ambr(dict, subscriber.max_req_bw_ul, subscriber.max_req_bw_dl)),
    );

    let mut profile = Grouped::new(vec![], Arc::clone(dict));
    profile.add_avp(
        1423,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        Unsigned32::new(subscriber.default_apn).into(),
    );
    profile.add_avp(
        1428,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        Enumerated::new(ALL_APN_CONFIGURATIONS_INCLUDED).into(),
    );
    for apn in &subscriber.apns {
        if let Some(cfg) = build_apn_configuration(dict, subscriber, apn.context_id) {
            profile.add_avp(
                1430,
                Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
                crate::avp::flags::M,
                crate::avp::AvpValue::Grouped(cfg),
            );
        }
    }
    data.add_avp(
        1429,
        Some(crate::hss::result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        crate::avp::AvpValue::Grouped(profile),
    );

    data
}
