//! Purge-UE (PUR → PUA), §4.5.

use crate::avp::Unsigned32;
use crate::diameter::DiameterMessage;
use crate::hss::counters::{AnswerKind, Counters, Route};
use crate::hss::handlers::{extract_imsi, get_identity};
use crate::hss::result_code;
use crate::hss::store::SubscriberStore;
use crate::hss::{response, HandlerError};

const PUA_FLAGS_UE_PURGED: u32 = 0x0000_0001;
const PUA_FLAGS_NONE: u32 = 0x0000_0000;

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
    counters.incr_request(Route::Pur);

    let imsi = match extract_imsi(req) {
        Ok(imsi) => imsi,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };

    let subscriber = match store.get_by_imsi(&imsi).await {
        Some(subscriber) => subscriber,
        None => {
            counters.incr_answer(Route::Pur, AnswerKind::UserUnknown);
            return response::experimental_result(
                req,
                origin_host,
                origin_realm,
                result_code::DIAMETER_ERROR_USER_UNKNOWN,
            );
        }
    };

    let requesting_host = get_identity(req, "origin_host").unwrap_or_default();
    let pua_flags = if subscriber.has_registered_mme() && subscriber.mme_hostname != requesting_host {
        PUA_FLAGS_NONE
    } else {
        PUA_FLAGS_UE_PURGED
    };

    counters.incr_answer(Route::Pur, AnswerKind::Success);
    let mut ans = response::success(req, origin_host, origin_realm);
    ans.add_avp(crate::avp!(
        1442,
        Some(result_code::THREEGPP_VENDOR_ID),
        crate::avp::flags::M,
        Unsigned32::new(pua_flags)
    ));
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
    counters.incr_answer(Route::Pur, kind);
    response::from_handler_error(req, origin_host, origin_realm, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp;
    use crate::avp::flags::M;
    use crate::avp::{Identity, UTF8String};
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

    fn pur_request(dict: Arc<Dictionary>, imsi: &str, origin_host: &str) -> DiameterMessage {
        let mut req = DiameterMessage::new(CommandCode::PurgeUE, ApplicationId::S6a, crate::diameter::flags::REQUEST, 1, 1, Arc::clone(&dict));
        req.add_avp(avp!(1, None, M, UTF8String::new(imsi)));
        req.add_avp(avp!(264, None, M, Identity::new(origin_host)));
        req
    }

    #[tokio::test]
    async fn test_user_unknown() {
        let dict = dict();
        let store = InMemoryStore::new();
        let counters = InMemoryCounters::new();
        let req = pur_request(dict, "999000000000001", "mme1.epc");
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_ERROR_USER_UNKNOWN
        );
    }

    #[tokio::test]
    async fn test_success_purged_flag_when_no_mme_ever_registered() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001")).await;
        let counters = InMemoryCounters::new();
        let req = pur_request(dict, "999000000000001", "mme1.epc");
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_SUCCESS);
        assert_eq!(ans.get_avp(1442).unwrap().get_unsigned32().unwrap(), PUA_FLAGS_UE_PURGED);
    }

    #[tokio::test]
    async fn test_success_purged_flag_when_requester_is_registered_mme() {
        let dict = dict();
        let store = InMemoryStore::new();
        let mut sub = subscriber("999000000000001");
        sub.mme_hostname = "mme1.epc".into();
        store.provision(sub).await;
        let counters = InMemoryCounters::new();
        let req = pur_request(dict, "999000000000001", "mme1.epc");
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(1442).unwrap().get_unsigned32().unwrap(), PUA_FLAGS_UE_PURGED);
    }

    #[tokio::test]
    async fn test_no_purged_flag_when_requester_is_not_registered_mme() {
        let dict = dict();
        let store = InMemoryStore::new();
        let mut sub = subscriber("999000000000001");
        sub.mme_hostname = "mme-old.epc".into();
        store.provision(sub).await;
        let counters = InMemoryCounters::new();
        let req = pur_request(dict, "999000000000001", "mme-new.epc");
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_SUCCESS);
        assert_eq!(ans.get_avp(1442).unwrap().get_unsigned32().unwrap(), PUA_FLAGS_NONE);
    }
}
