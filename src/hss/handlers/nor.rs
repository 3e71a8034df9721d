//! Notify (NOR → NOA), §4.6.

use crate::avp::Avp;
use crate::diameter::DiameterMessage;
use crate::hss::counters::{AnswerKind, Counters, Route};
use crate::hss::handlers::{extract_imsi, get_identity};
use crate::hss::result_code;
use crate::hss::store::SubscriberStore;
use crate::hss::{response, HandlerError};

struct Mip6Update {
    context_id: u32,
    destination_host: String,
    destination_realm: String,
}

fn extract_context_id(req: &DiameterMessage) -> Result<u32, HandlerError> {
    let avp = req
        .get_avp_by_name("context_identifier")
        .expect("registered dictionary AVP")
        .ok_or_else(|| HandlerError::missing("Context-Identifier AVP not found"))?;
    avp.get_unsigned32()
        .ok_or_else(|| HandlerError::invalid_value("Context-Identifier AVP has invalid value", avp.clone()))
}

fn extract_service_selection(req: &DiameterMessage) -> Result<String, HandlerError> {
    let avp = req
        .get_avp_by_name("service_selection")
        .expect("registered dictionary AVP")
        .ok_or_else(|| HandlerError::missing("Service-Selection AVP not found"))?;
    Ok(avp.get_utf8string().unwrap_or_default().to_string())
}

fn extract_mip6_update(req: &DiameterMessage, context_id: u32) -> Result<Mip6Update, HandlerError> {
    let outer = req
        .get_avp_by_name("mip6_agent_info")
        .expect("registered dictionary AVP")
        .ok_or_else(|| HandlerError::missing("MIP6-Agent-Info AVP not found"))?;
    let outer_grouped = outer
        .get_grouped()
        .ok_or_else(|| HandlerError::invalid_value("MIP6-Agent-Info AVP has invalid value", outer.clone()))?;

    let home_agent_host = outer_grouped
        .get_avp(348)
        .ok_or_else(|| HandlerError::missing_with_failed("MIP-Home-Agent-Host AVP not found", outer.clone()))?;
    let home_agent_host = home_agent_host
        .get_grouped()
        .ok_or_else(|| HandlerError::invalid_value("MIP-Home-Agent-Host AVP has invalid value", home_agent_host.clone()))?;

    let destination_host: Avp = home_agent_host
        .get_avp(293)
        .ok_or_else(|| HandlerError::missing_with_failed("Destination-Host AVP not found", outer.clone()))?
        .clone();
    let destination_realm: Avp = home_agent_host
        .get_avp(283)
        .ok_or_else(|| HandlerError::missing_with_failed("Destination-Realm AVP not found", outer.clone()))?
        .clone();

    Ok(Mip6Update {
        context_id,
        destination_host: destination_host.get_identity().unwrap_or_default().into_owned(),
        destination_realm: destination_realm.get_identity().unwrap_or_default().into_owned(),
    })
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
    counters.incr_request(Route::Nor);

    let imsi = match extract_imsi(req) {
        Ok(imsi) => imsi,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };

    let subscriber = match store.get_by_imsi(&imsi).await {
        Some(subscriber) => subscriber,
        None => {
            counters.incr_answer(Route::Nor, AnswerKind::UserUnknown);
            return response::experimental_result(
                req,
                origin_host,
                origin_realm,
                result_code::DIAMETER_ERROR_USER_UNKNOWN,
            );
        }
    };

    let requesting_host = get_identity(req, "origin_host").unwrap_or_default();
    if subscriber.has_registered_mme() && subscriber.mme_hostname != requesting_host {
        counters.incr_answer(Route::Nor, AnswerKind::UnknownServingNode);
        return response::experimental_result(
            req,
            origin_host,
            origin_realm,
            result_code::DIAMETER_ERROR_UNKOWN_SERVING_NODE,
        );
    }

    let context_id = match extract_context_id(req) {
        Ok(context_id) => context_id,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };
    if let Err(err) = extract_service_selection(req) {
        return answer_error(req, counters, origin_host, origin_realm, err);
    }
    let update = match extract_mip6_update(req, context_id) {
        Ok(update) => update,
        Err(err) => return answer_error(req, counters, origin_host, origin_realm, err),
    };

    store
        .set_mip6(&imsi, update.context_id, &update.destination_host, &update.destination_realm)
        .await;

    counters.incr_answer(Route::Nor, AnswerKind::Success);
    response::success(req, origin_host, origin_realm)
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
    counters.incr_answer(Route::Nor, kind);
    response::from_handler_error(req, origin_host, origin_realm, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp;
    use crate::avp::flags::M;
    use crate::avp::{Grouped, Identity, UTF8String, Unsigned32};
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

    fn nor_request(dict: Arc<Dictionary>, imsi: &str, origin_host: &str, mip6: Option<(&str, &str)>) -> DiameterMessage {
        let mut req = DiameterMessage::new(CommandCode::Notify, ApplicationId::S6a, crate::diameter::flags::REQUEST, 1, 1, Arc::clone(&dict));
        req.add_avp(avp!(1, None, M, UTF8String::new(imsi)));
        req.add_avp(avp!(264, None, M, Identity::new(origin_host)));
        req.add_avp(avp!(1423, Some(10415), M, Unsigned32::new(1)));
        req.add_avp(avp!(493, None, M, UTF8String::new("internet")));
        if let Some((host, realm)) = mip6 {
            let mut home_agent_host = Grouped::new(vec![], Arc::clone(&dict));
            home_agent_host.add_avp(293, None, M, Identity::new(host).into());
            home_agent_host.add_avp(283, None, M, Identity::new(realm).into());
            let mut agent_info = Grouped::new(vec![], Arc::clone(&dict));
            agent_info.add_avp(348, None, M, crate::avp::AvpValue::Grouped(home_agent_host));
            req.add_avp(avp!(486, None, M, agent_info));
        }
        req
    }

    #[tokio::test]
    async fn test_user_unknown() {
        let dict = dict();
        let store = InMemoryStore::new();
        let counters = InMemoryCounters::new();
        let req = nor_request(dict, "999000000000001", "mme1.epc", Some(("pgw1.epc", "epc.mnc001.mcc001.3gppnetwork.org")));
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_ERROR_USER_UNKNOWN
        );
    }

    #[tokio::test]
    async fn test_unknown_serving_node() {
        let dict = dict();
        let store = InMemoryStore::new();
        let mut sub = subscriber("999000000000001");
        sub.mme_hostname = "mme-old.epc".into();
        store.provision(sub).await;
        let counters = InMemoryCounters::new();
        let req = nor_request(dict, "999000000000001", "mme-new.epc", Some(("pgw1.epc", "epc.mnc001.mcc001.3gppnetwork.org")));
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        let experimental = ans.get_avp(297).unwrap().get_grouped().unwrap();
        assert_eq!(
            experimental.get_avp(298).unwrap().get_unsigned32().unwrap(),
            result_code::DIAMETER_ERROR_UNKOWN_SERVING_NODE
        );
    }

    #[tokio::test]
    async fn test_missing_mip6_agent_info() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001")).await;
        let counters = InMemoryCounters::new();
        let req = nor_request(dict, "999000000000001", "mme1.epc", None);
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_MISSING_AVP);
        assert!(ans.get_avp(279).is_none());
    }

    #[tokio::test]
    async fn test_success_updates_mip6_row() {
        let dict = dict();
        let store = InMemoryStore::new();
        store.provision(subscriber("999000000000001")).await;
        let counters = InMemoryCounters::new();
        let req = nor_request(
            dict,
            "999000000000001",
            "mme1.epc",
            Some(("pgw1.epc.mnc001.mcc001.3gppnetwork.org", "epc.mnc001.mcc001.3gppnetwork.org")),
        );
        let ans = handle(&req, &store, &counters, "hss1", "epc").await;
        assert_eq!(ans.get_avp(268).unwrap().get_unsigned32().unwrap(), result_code::DIAMETER_SUCCESS);
        let got = store.get_by_imsi("999000000000001").await.unwrap();
        assert!(got.mip6(1).unwrap().is_bound());
        assert_eq!(
            got.mip6(1).unwrap().destination_host.as_deref(),
            Some("pgw1.epc.mnc001.mcc001.3gppnetwork.org")
        );
    }
}
