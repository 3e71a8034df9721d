//! Authentication-Information (AIR → AIA), §4.3.

use crate::avp::{Grouped, Unsigned32};
use crate::diameter::DiameterMessage;
use crate::hss::counters::{AnswerKind, Counters, Route};
use crate::hss::handlers::{extract_imsi, extract_visited_plmn};
use crate::hss::result_code;
use crate::hss::store::SubscriberStore;
use crate::hss::{response, HandlerError};
use crate::milenage;

/// Above this many requested vectors in one AIR, the subscriber store is not
/// even consulted (§4.3 step 5).
const MAX_REQUESTED_VECTORS: u32 = 5;

fn extract_vector_count(req: &DiameterMessage) -> Result<(Grouped, u32, Option<u32>), HandlerError> {
    let outer = req
        .get_avp_by_name("requested_eutran_authentication_info")
        .expect("registered dictionary AVP")
        .ok_or_else(|| HandlerError::missing("Requested-EUTRAN-Authentication-Info AVP not found"))?;
    let grouped = outer
        .get_grouped()
        .ok_or_else(|| HandlerError::invalid_value("Requested-EUTRAN-Authentication-Info AVP has invalid value", outer.clone()))?;
    let count = grouped
        .get_avp(1410)
        .ok_or_else(|| HandlerError::missing_with_failed("Number-Of-Requested-Vectors AVP not found", outer.clone()))?
        .get_unsigned32()
        .ok_or_else(|| HandlerError::invalid_value("Number-Of-Requested-Vectors AVP has invalid value", outer.clone()))?;
    let immediate = grouped.get_avp(1412).and_then(|a| a.get_unsigned32());

    if let Some(resync) = grouped.get_avp(1411).and_then(|a| a.get_octetstring()) {
        if resync.len() >= 16 {
            log::debug!("AIR carried Re-Synchronization-Info, ignoring (no SQN resync support)");
        }
    }

    Ok((grouped.clone(), count, immediate))
}

fn advance_sqn(sqn: &mut [u8; 6]) {
    let mut value = 0u64;
    for &b in sqn.iter() {
        value = (value << 8) | b as u64;
    }
    value = value.wrapping_add(1) & 0x0000_FFFF_FFFF_FFFF;
    let bytes = value.to_be_bytes();
    sqn.copy_from_slice(&bytes[2..8]);
}

pub async fn handle<S, C>(
    req: &DiameterMessage,
    store: &S,
    counters: &C,
    origin_host: &str,
    origin_realm: &str,
) -> DiameterMessage
where
    S: SubscriberStore,
    C: Counters,
{
    counters.incr_request(Route::Air);

    let imsi = match extract_imsi(req) {
        Ok(imsi) => imsi,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };
    let plmn = match extract_visited_plmn(req) {
        Ok(plmn) => plmn,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };
    let (outer, requested, immediate) = match extract_vector_count(req) {
        Ok(values) => values,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };

    if store.get_by_imsi(&imsi).await.is_none() {
        counters.incr_answer(Route::Air, AnswerKind::UserUnknown);
        return response::experimental_result(
            req,
            origin_host,
            origin_realm,
            result_code::DIAMETER_ERROR_USER_UNKNOWN,
        );
    }

    let n = immediate.unwrap_or(requested);
    if n >= MAX_REQUESTED_VECTORS {
        counters.incr_answer(Route::Air, AnswerKind::AuthenticationDataUnavailable);
        let dict = req.dictionary();
        let failed = crate::avp::Avp::new(
            1408,
            Some(result_code::THREEGPP_VENDOR_ID),
            crate::avp::flags::M,
            crate::avp::AvpValue::Grouped(outer),
            dict,
        );
        let message = if immediate.is_some() {
            "Immediate-Response-Preferred AVP requests too many vectors"
        } else {
            "Number-Of-Requested-Vectors AVP requests too many vectors"
        };
        return response::experimental_result_with_failed_avp(
            req,
            origin_host,
            origin_realm,
            result_code::DIAMETER_AUTHENTICATION_DATA_UNAVAILABLE,
            message,
            failed,
        );
    }

    let vectors = store
        .with_subscriber(&imsi, |sub| {
            let mut vectors = Vec::with_capacity(n as usize);
            for _ in 0..n {
                advance_sqn(&mut sub.sqn);
                vectors.push(milenage::make_vector(&sub.k, &sub.opc, &sub.amf, &sub.sqn, &plmn, None));
            }
            vectors
        })
        .await;

    let vectors = match vectors {
        Some(vectors) => vectors,
        None => {
            counters.incr_answer(Route::Air, AnswerKind::UserUnknown);
            return response::experimental_result(
                req,
                origin_host,
                origin_realm,
                result_code::DIAMETER_ERROR_USER_UNKNOWN,
            );
        }
    };

    counters.incr_answer(Route::Air, AnswerKind::Success);
    let mut ans = response::success(req, origin_host, origin_realm);
    let dict = ans.dictionary();
    let mut auth_info = Grouped::new(vec![], dict.clone());
    for (index, vector) in vectors.iter().enumerate() {
        let mut e_utran_vector = Grouped::new(vec![], dict.clone());
        if vectors.len() > 1 {
            e_utran_vector.add_avp(1419, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, Unsigned32::new((index + 1) as u32).into());
        }
        e_utran_vector.add_avp(1447, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, crate::avp::OctetString::new(vector.rand.to_vec()).into());
        e_utran_vector.add_avp(1448, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, crate::avp::OctetString::new(vector.xres.to_vec()).into());
        e_utran_vector.add_avp(1449, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, crate::avp::OctetString::new(vector.autn.to_vec()).into());
        e_utran_vector.add_avp(1450, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, crate::avp::OctetString::new(vector.kasme.to_vec()).into());
        auth_info.add_avp(1414, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, crate::avp::AvpValue::Grouped(e_utran_vector));
    }
    ans.add_avp(crate::avp!(1413, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, auth_info));
    ans
}

fn answer_error<C: Counters>(
    req: &DiameterMessage,
    counters: &C,
    origin_host: &str,
    origin_realm: &str,
    err: HandlerError,
) -> DiameterMessage {
    let kind = match &err {
        HandlerError::MissingAvp { .. } => AnswerKind::MissingAvp,
        HandlerError::InvalidAvpValue { .. } => AnswerKind::InvalidAvpValue,
    };
    counters.incr_answer(Route::Air, kind);
    response::from_handler_error(req, origin_host, origin_realm, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp;
    use crate::avp::flags::M;
    use crate::avp::{Identity, OctetString, UTF8String};
    use crate::diameter::{ApplicationId, CommandCode};
    use crate::dictionary::{self, Dictionary};
    use crate::hss::counters::InMemoryCounters;
    use crate::hss::store::InMemoryStore;
    use crate::hss::subscriber::{Apn, Mip6, OdbSetting, PdnType, SrvccSupport, Subscriber};
    use std::sync::Arc;

    fn dict() -> Arc<Dictionary> {
        Arc::new(Dictionary::new(&[&dictionary::DEFAULT_DICT_XML]))
    }

    fn subscriber(imsi: &str) -> Subscriber {
        Subscriber {
            imsi: imsi.to_string(),
            k: [0x46, 0x5B, 0x5C, 0xE8, 0xB1, 0x99, 0xB4, 0x9F, 0xAA, 0x5F, 0x0A, 0x2E, 0xE2, 0x38, 0xA6, 0xBC],
            opc: [0xCD, 0x63, 0xCB, 0x71, 0x95, 0x4A, 0x9F, 0x4A, 0x4E, 0x4E, 0x4A, 0x26, 0x5D, 0x01, 0x71, 0x04],
            amf: [0x80, 0x00],
            sqn: [0, 0, 0, 0, 0, 0],
            msisdn: "447700900123".into(),
            stn_sr: None,
            roaming_allowed: true,
            odb: OdbSetting::None,
            schar: 8,
            max_req_bw_ul: 50_000_000,
            max_req_bw_dl: 100_000_000,
            default_apn: 1,
            apns: vec![Apn {
                context_id: 1,
                apn_name: "internet".into(),
                pdn_type: PdnType::IPv4v6,
                qci: 9,
                priority_level: 8,
                max_req_bw_ul: 50_000_000,
                max_req_bw_dl: 100_000_000,
            }],
            mip6: vec![Mip6::empty(1, "internet")],
            mme_hostname: String::new(),
            mme_realm: String::new(),
            ue_srvcc_support: SrvccSupport::Unknown,
        }
    }

    fn air_request(dict: Arc<Dictionary>, imsi: &str, vectors: u32) -> DiameterMessage {
        let mut req = DiameterMessage::new(CommandCode::AuthenticationInformation, ApplicationId::S6a, crate::diameter::flags::REQUEST, 1, 1, Arc::clone(&dict));
        req.add_avp(avp!(1, None, M, UTF8String::new(imsi)));
        req.add_avp(avp!(1407, Some(10415), M, OctetString::new(vec![0x21, 0xf4, 0x75])));
        let mut info = Grouped::new(vec![], Arc::clone(&dict));
        info.add_avp(1410, Some(10415), M, Unsigned32::new(vectors).into());
        req.add_avp(avp!(1408, Some(10415), M, info));
        req
    }

    #[tokio::test]
    async fn test_missing_user_name() {
        let dict = dict();
        let store = InMemoryStore::new();
        let counters = InMemoryCounters::new();
        let mut req = air_request(Arc::clone(&dict), "999000000000001", 1);
        req.avps.remove(0);
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_MISSING_AVP);
        assert_eq!(counters.get("air:num_answers:missing_avp"), 1);
    }

    #[tokio::test]
    async fn test_user_unknown() {
        let dict = dict();
        let store = InMemoryStore::new();
        let counters = InMemoryCounters::new();
        let req = air_request(dict, "999000000000001", 1);
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(297).unwrap().get_grouped().unwrap().get_avp(298).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_ERROR_USER_UNKNOWN);
    }

    #[tokio::test]
    async fn test_too_many_vectors() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001")).await;
        let counters = InMemoryCounters::new();
        let req = air_request(dict, "999000000000001", 5);
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_AUTHENTICATION_DATA_UNAVAILABLE
        );
        assert!(ans.get_avp(279).is_some());
    }

    #[tokio::test]
    async fn test_success_single_vector_omits_item_number() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001")).await;
        let counters = InMemoryCounters::new();
        let req = air_request(dict, "999000000000001", 1);
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_SUCCESS);
        let auth_info = ans.get_avp(1413).unwrap().get_grouped().unwrap();
        assert_eq!(auth_info.avps().len(), 1);
        let vector = auth_info.get_avp(1414).unwrap().get_grouped().unwrap();
        assert!(vector.get_avp(1419).is_none());
        assert_eq!(vector.get_avp(1447).unwrap().get_octetstring().unwrap().len(), 16);

        let got = store.get_by_imsi("999000000000001").await.unwrap();
        assert_eq!(got.sqn, [0, 0, 0, 0, 0, 1]);
    }

    #[tokio::test]
    async fn test_success_multiple_vectors_numbered() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001")).await;
        let counters = InMemoryCounters::new();
        let req = air_request(dict, "999000000000001", 3);
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        let auth_info = ans.get_avp(1413).unwrap().get_grouped().unwrap();
        assert_eq!(auth_info.avps().len(), 3);
        let got = store.get_by_imsi("999000000000001").await.unwrap();
        assert_eq!(got.sqn, [0, 0, 0, 0, 0, 3]);
    }
}
