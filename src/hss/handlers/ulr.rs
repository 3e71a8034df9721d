//! Update-Location (ULR → ULA), §4.4.

use crate::avp::{Enumerated, Grouped, Unsigned32};
use crate::diameter::DiameterMessage;
use crate::hss::counters::{AnswerKind, Counters, Route};
use crate::hss::handlers::{extract_imsi, extract_visited_plmn, get_identity};
use crate::hss::peer::PeerRegistry;
use crate::hss::result_code;
use crate::hss::store::SubscriberStore;
use crate::hss::subscriber::{OdbSetting, SrvccSupport};
use crate::hss::{response, subscription_data, HandlerError};
use crate::plmn;
use std::sync::Arc;

const RAT_TYPE_EUTRAN: i32 = 1004;
const FEATURE_LIST_ODB_BITS: u32 = 0b111;
const ULA_FLAGS_SEPARATION: u32 = 0x0000_0001;
const UE_SRVCC_NOT_SUPPORTED: i32 = 0;
const UE_SRVCC_SUPPORTED: i32 = 1;

fn extract_rat_type(req: &DiameterMessage) -> Result<i32, HandlerError> {
    let avp = req
        .get_avp_by_name("rat_type")
        .expect("rat_type is a registered dictionary AVP")
        .ok_or_else(|| HandlerError::missing("RAT-Type AVP not found"))?;
    avp.get_enumerated()
        .ok_or_else(|| HandlerError::invalid_value("RAT-Type AVP has invalid value", avp.clone()))
}

fn extract_srvcc_capability(req: &DiameterMessage) -> SrvccSupport {
    let Ok(Some(avp)) = req.get_avp_by_name("ue_srvcc_capability") else {
        return SrvccSupport::Unknown;
    };
    match avp.get_enumerated() {
        Some(UE_SRVCC_SUPPORTED) => SrvccSupport::True,
        Some(UE_SRVCC_NOT_SUPPORTED) => SrvccSupport::False,
        _ => SrvccSupport::Unknown,
    }
}

/// Attaches `Supported-Features` and `ULA-Flags`, present on every ULA this
/// HSS emits regardless of outcome (§4.4 preamble).
fn add_ulr_preamble(ans: &mut DiameterMessage) {
    let dict = ans.dictionary();
    let mut supported_features = Grouped::new(vec![], Arc::clone(&dict));
    supported_features.add_avp(266, None, crate::avp::flags::M, Unsigned32::new(result_code::THREEGPP_VENDOR_ID).into());
    supported_features.add_avp(629, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, Unsigned32::new(1).into());
    supported_features.add_avp(630, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, Unsigned32::new(FEATURE_LIST_ODB_BITS).into());
    ans.add_avp(crate::avp!(628, Some(result_code::THREEGPP_VENDOR_ID), crate::avp::flags::M, supported_features));
    ans.add_avp(crate::avp!(
        1406,
        Some(result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        Unsigned32::new(ULA_FLAGS_SEPARATION)
    ));
}

fn error_diagnostic_for(odb: OdbSetting) -> Option<i32> {
    match odb {
        OdbSetting::None => None,
        OdbSetting::AllApn => Some(result_code::ERROR_DIAGNOSTIC_ODB_ALL_APN),
        OdbSetting::HplmnApn => Some(result_code::ERROR_DIAGNOSTIC_ODB_HPLMN_APN),
        OdbSetting::VplmnApn => Some(result_code::ERROR_DIAGNOSTIC_ODB_VPLMN_APN),
    }
}

pub async fn handle<S, C>(
    req: &DiameterMessage,
    store: &S,
    counters: &C,
    peers: &Arc<PeerRegistry<C>>,
    origin_host: &str,
    origin_realm: &str,
) -> DiameterMessage
where
    S: SubscriberStore,
    C: Counters + 'static,
{
    counters.incr_request(Route::Ulr);

    let answer = |mut ans: DiameterMessage| {
        add_ulr_preamble(&mut ans);
        ans
    };

    let imsi = match extract_imsi(req) {
        Ok(imsi) => imsi,
        Err(err) => return answer(answer_error(req, counters, origin_host, origin_realm, err)),
    };
    if let Err(err) = extract_visited_plmn(req) {
        return answer(answer_error(req, counters, origin_host, origin_realm, err));
    }

    let rat_type = match extract_rat_type(req) {
        Ok(rat_type) => rat_type,
        Err(err) => return answer(answer_error(req, counters, origin_host, origin_realm, err)),
    };
    if rat_type != RAT_TYPE_EUTRAN {
        counters.incr_answer(Route::Ulr, AnswerKind::RatNotAllowed);
        return answer(response::experimental_result(
            req,
            origin_host,
            origin_realm,
            result_code::DIAMETER_ERROR_RAT_NOT_ALLOWED,
        ));
    }

    let subscriber = match store.get_by_imsi(&imsi).await {
        Some(subscriber) => subscriber,
        None => {
            counters.incr_answer(Route::Ulr, AnswerKind::UserUnknown);
            return answer(response::experimental_result(
                req,
                origin_host,
                origin_realm,
                result_code::DIAMETER_ERROR_USER_UNKNOWN,
            ));
        }
    };

    let req_origin_realm = get_identity(req, "origin_realm").unwrap_or_default();
    let req_destination_realm = get_identity(req, "destination_realm").unwrap_or_default();
    let is_roaming = req_destination_realm != req_origin_realm;

    if !subscriber.roaming_allowed && is_roaming {
        if !plmn::is_3gpp_realm(&req_origin_realm) {
            counters.incr_answer(Route::Ulr, AnswerKind::RealmNotServed);
            return answer(response::realm_not_served(
                req,
                origin_host,
                origin_realm,
                "Origin-Realm AVP does not comply with 3GPP format: mncMNC.mccMCC.3gppnetwork.org",
            ));
        }
        counters.incr_answer(Route::Ulr, AnswerKind::RoamingNotAllowed);
        return answer(response::experimental_result_with_diagnostic(
            req,
            origin_host,
            origin_realm,
            result_code::DIAMETER_ERROR_ROAMING_NOT_ALLOWED,
            error_diagnostic_for(subscriber.odb),
        ));
    }

    if subscriber.apns.is_empty() {
        counters.incr_answer(Route::Ulr, AnswerKind::UnknownEpsSubscription);
        return answer(response::experimental_result(
            req,
            origin_host,
            origin_realm,
            result_code::DIAMETER_ERROR_UNKNOWN_EPS_SUBSCRIPTION,
        ));
    }

    let requesting_mme_host = get_identity(req, "origin_host").unwrap_or_default();
    let requesting_mme_realm = req_origin_realm.clone();
    if subscriber.has_registered_mme() && subscriber.mme_hostname != requesting_mme_host {
        peers.send_clr(subscriber.mme_hostname.clone(), subscriber.mme_realm.clone(), imsi.clone());
    }

    let srvcc = extract_srvcc_capability(req);
    store.set_mme(&imsi, &requesting_mme_host, &requesting_mme_realm, srvcc).await;

    counters.incr_answer(Route::Ulr, AnswerKind::Success);
    let mut ans = response::success(req, origin_host, origin_realm);
    let dict = ans.dictionary();
    ans.add_avp(crate::avp!(
        1400,
        Some(result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        subscription_data::build(&dict, &subscriber)
    ));
    answer(ans)
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
    counters.incr_answer(Route::Ulr, kind);
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
    use crate::hss::subscriber::{Apn, Mip6, PdnType, Subscriber};
    use std::collections::HashMap;

    fn dict() -> Arc<Dictionary> {
        Arc::new(Dictionary::new(&[&dictionary::DEFAULT_DICT_XML]))
    }

    fn peers(dict: Arc<Dictionary>, counters: Arc<InMemoryCounters>) -> Arc<PeerRegistry<InMemoryCounters>> {
        Arc::new(PeerRegistry::new("hss1", "epc.mnc001.mcc001.3gppnetwork.org", dict, counters, HashMap::new()))
    }

    fn subscriber(imsi: &str, roaming_allowed: bool, odb: OdbSetting) -> Subscriber {
        Subscriber {
            imsi: imsi.to_string(),
            k: [0; 16],
            opc: [0; 16],
            amf: [0; 2],
            sqn: [0; 6],
            msisdn: "447700900123".into(),
            stn_sr: None,
            roaming_allowed,
            odb,
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

    fn ulr_request(dict: Arc<Dictionary>, imsi: &str, origin_host: &str, origin_realm: &str, destination_realm: &str) -> DiameterMessage {
        let mut req = DiameterMessage::new(CommandCode::UpdateLocation, ApplicationId::S6a, crate::diameter::flags::REQUEST, 1, 1, Arc::clone(&dict));
        req.add_avp(avp!(1, None, M, UTF8String::new(imsi)));
        req.add_avp(avp!(264, None, M, Identity::new(origin_host)));
        req.add_avp(avp!(296, None, M, Identity::new(origin_realm)));
        req.add_avp(avp!(283, None, M, Identity::new(destination_realm)));
        req.add_avp(avp!(1407, Some(10415), M, OctetString::new(vec![0x21, 0xf4, 0x75])));
        req.add_avp(avp!(1032, Some(10415), M, Enumerated::new(RAT_TYPE_EUTRAN)));
        req
    }

    #[tokio::test]
    async fn test_always_carries_supported_features_and_ula_flags() {
        let dict = dict();
        let store = InMemoryStore::new();
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let req = ulr_request(dict, "999000000000001", "mme1.epc", "epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org");
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        assert!(ans.get_avp(628).is_some());
        assert_eq!(ans.get_avp(1406).unwrap().get_unsigned32().unwrap(), ULA_FLAGS_SEPARATION);
    }

    #[tokio::test]
    async fn test_rat_not_allowed() {
        let dict = dict();
        let store = InMemoryStore::new();
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let mut req = ulr_request(dict, "999000000000001", "mme1.epc", "epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org");
        req.avps.pop();
        req.add_avp(avp!(1032, Some(10415), M, Enumerated::new(1000)));
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_ERROR_RAT_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_roaming_not_allowed_for_barred_subscriber() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001", false, OdbSetting::AllApn)).await;
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let req = ulr_request(dict, "999000000000001", "mme1.epc", "epc.mnc002.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org");
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_ERROR_ROAMING_NOT_ALLOWED
        );
        assert_eq!(
            ans.get_avp(2103).unwrap().get_enumerated().unwrap(),
            result_code::ERROR_DIAGNOSTIC_ODB_ALL_APN
        );
    }

    #[tokio::test]
    async fn test_realm_not_served_when_origin_realm_not_3gpp_form() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001", false, OdbSetting::AllApn)).await;
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let req = ulr_request(dict, "999000000000001", "mme1.epc", "not-a-3gpp-realm.example.com", "epc.mnc001.mcc001.3gppnetwork.org");
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        assert_eq!(
            ans.get_avp(268).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_REALM_NOT_SERVED
        );
    }

    #[tokio::test]
    async fn test_unknown_eps_subscription_when_no_apns() {
        let dict = dict();
        let store = InMemoryStore::new();
        let mut sub = subscriber("999000000000001", true, OdbSetting::None);
        sub.apns.clear();
        sub.mip6.clear();
        sub.default_apn = 0;
        store.provision(sub).await;
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let req = ulr_request(dict, "999000000000001", "mme1.epc", "epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org");
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_ERROR_UNKNOWN_EPS_SUBSCRIPTION
        );
    }

    #[tokio::test]
    async fn test_success_writes_back_mme_and_subscription_data() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001", true, OdbSetting::None)).await;
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let req = ulr_request(dict, "999000000000001", "mme1.epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org");
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_SUCCESS);
        assert!(ans.get_avp(1400).is_some());
        let got = store.get_by_imsi("999000000000001").await.unwrap();
        assert_eq!(got.mme_hostname, "mme1.epc.mnc001.mcc001.3gppnetwork.org");
    }

    #[tokio::test]
    async fn test_new_mme_identity_originates_clr() {
        let dict = dict();
        let store = InMemoryStore::new();
        let mut sub = subscriber("999000000000001", true, OdbSetting::None);
        sub.mme_hostname = "mme-old.epc.mnc001.mcc001.3gppnetwork.org".into();
        sub.mme_realm = "epc.mnc001.mcc001.3gppnetwork.org".into();
        store.provision(sub).await;
        let counters = Arc::new(InMemoryCounters::new());
        let p = peers(Arc::clone(&dict), Arc::clone(&counters));
        let req = ulr_request(dict, "999000000000001", "mme-new.epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org");
        let ans = handle(&req, &store, &*counters, &p, "hss1", "epc.mnc001.mcc001.3gppnetwork.org").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_SUCCESS);
        let got = store.get_by_imsi("999000000000001").await.unwrap();
        assert_eq!(got.mme_hostname, "mme-new.epc.mnc001.mcc001.3gppnetwork.org");
    }
}
