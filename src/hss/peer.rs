//! The peer/transaction layer (§4.7): routes an inbound S6a request to its
//! command handler, answers anything else with DIAMETER_COMMAND_UNSUPPORTED,
//! and originates Cancel-Location-Request to a previously-registered MME on
//! ULR's behalf (§4.4 step 7) as a fire-and-forget transaction built on the
//! existing [`crate::transport`] client/server pair.

use crate::avp;
use crate::avp::flags::M;
use crate::avp::{Enumerated, Grouped, Identity, Unsigned32, UTF8String};
use crate::diameter::{flags, ApplicationId, CommandCode, DiameterMessage};
use crate::dictionary::Dictionary;
use crate::hss::counters::Counters;
use crate::hss::handlers;
use crate::hss::result_code::{DIAMETER_COMMAND_UNSUPPORTED, THREEGPP_VENDOR_ID};
use crate::hss::store::SubscriberStore;
use crate::error::Result;
use crate::transport::{DiameterClient, DiameterClientConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const S6A_APPLICATION_ID: u32 = 16777251;
const CANCELLATION_TYPE_MME_UPDATE_PROCEDURE: i32 = 0;
const CLR_TIMEOUT: Duration = Duration::from_secs(10);

/// Monotone end-to-end identifier generator, top 12 bits seeded with the
/// low 12 bits of wall-clock seconds as the base protocol recommends
/// (RFC 6733 §3), low 20 bits a plain incrementing counter.
struct EndToEndIdGenerator {
    counter: AtomicU32,
}

impl EndToEndIdGenerator {
    fn new() -> EndToEndIdGenerator {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let seed = (now & 0xFFF) << 20;
        EndToEndIdGenerator {
            counter: AtomicU32::new(seed),
        }
    }

    fn next(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

/// Originates a Cancel-Location-Request fire-and-forget (§4.4 step 7,
/// §4.7). A peer's client connection is dialled lazily and cached by
/// hostname; the answer, if any arrives before [`CLR_TIMEOUT`], is logged
/// and discarded rather than returned to the ULR caller.
pub struct PeerRegistry<C: Counters> {
    origin_host: String,
    origin_realm: String,
    dict: Arc<Dictionary>,
    counters: Arc<C>,
    end_to_end: EndToEndIdGenerator,
    clients: Mutex<HashMap<String, Arc<tokio::sync::Mutex<DiameterClient>>>>,
    /// hostname -> dial address, from the peer table (§6).
    dial_addresses: HashMap<String, String>,
}

impl<C: Counters + 'static> PeerRegistry<C> {
    pub fn new(
        origin_host: impl Into<String>,
        origin_realm: impl Into<String>,
        dict: Arc<Dictionary>,
        counters: Arc<C>,
        dial_addresses: HashMap<String, String>,
    ) -> PeerRegistry<C> {
        PeerRegistry {
            origin_host: origin_host.into(),
            origin_realm: origin_realm.into(),
            dict,
            counters,
            end_to_end: EndToEndIdGenerator::new(),
            clients: Mutex::new(HashMap::new()),
            dial_addresses: dial_addresses.into_iter().collect(),
        }
    }

    async fn client_for(&self, hostname: &str) -> Option<Arc<tokio::sync::Mutex<DiameterClient>>> {
        if let Some(existing) = self.clients.lock().unwrap().get(hostname).cloned() {
            return Some(existing);
        }
        let addr = self.dial_addresses.get(hostname)?.clone();
        let mut client = DiameterClient::new(
            &addr,
            DiameterClientConfig {
                use_tls: false,
                verify_cert: false,
            },
        );
        let mut handler = client.connect().await.ok()?;
        let dict = Arc::clone(&self.dict);
        tokio::spawn(async move {
            DiameterClient::handle(&mut handler, dict).await;
        });
        let client = Arc::new(tokio::sync::Mutex::new(client));
        self.clients
            .lock()
            .unwrap()
            .insert(hostname.to_string(), Arc::clone(&client));
        Some(client)
    }

    /// Builds and sends a CLR to `destination_host`/`destination_realm`
    /// naming `imsi`, without waiting for (or returning) the CLA.
    pub fn send_clr(self: &Arc<Self>, destination_host: String, destination_realm: String, imsi: String) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let Some(client) = registry.client_for(&destination_host).await else {
                log::error!(
                    "CLR to {} dropped: no dialable peer connection",
                    destination_host
                );
                return;
            };

            let mut req = DiameterMessage::new(
                CommandCode::CancelLocation,
                ApplicationId::S6a,
                flags::REQUEST,
                0,
                registry.end_to_end.next(),
                Arc::clone(&registry.dict),
            );

            let mut vsai = Grouped::new(vec![], Arc::clone(&registry.dict));
            vsai.add_avp(266, None, M, Unsigned32::new(THREEGPP_VENDOR_ID).into());
            vsai.add_avp(258, None, M, Unsigned32::new(S6A_APPLICATION_ID).into());
            req.add_avp(avp!(260, None, M, vsai));
            req.add_avp(avp!(264, None, M, Identity::new(&registry.origin_host)));
            req.add_avp(avp!(296, None, M, Identity::new(&registry.origin_realm)));
            req.add_avp(avp!(293, None, M, Identity::new(&destination_host)));
            req.add_avp(avp!(283, None, M, Identity::new(&destination_realm)));
            req.add_avp(avp!(1, None, M, Identity::new(&imsi)));
            req.add_avp(avp!(
                1420,
                Some(THREEGPP_VENDOR_ID),
                M,
                Enumerated::new(CANCELLATION_TYPE_MME_UPDATE_PROCEDURE)
            ));
            req.add_avp(avp!(
                263,
                None,
                M,
                UTF8String::new(format!("{};{}", registry.origin_host, imsi))
            ));

            let hop_by_hop = {
                let mut client = client.lock().await;
                req.header.hop_by_hop_id = client.get_next_seq_num();
                match client.send_message(req).await {
                    Ok(response) => Some(response),
                    Err(e) => {
                        log::error!("failed to send CLR to {}: {}", destination_host, e);
                        None
                    }
                }
            };

            if let Some(response) = hop_by_hop {
                match tokio::time::timeout(CLR_TIMEOUT, response).await {
                    Ok(Ok(cla)) => log::debug!("CLA received for {}: {}", imsi, cla),
                    Ok(Err(e)) => log::error!("CLR to {} failed: {}", destination_host, e),
                    Err(_) => {
                        log::warn!("CLR to {} for {} timed out", destination_host, imsi);
                        registry.counters.incr("clr:timeout");
                    }
                }
            }
        });
    }
}

/// Routes an inbound request to its S6a command handler (§4.7). Requests
/// with no registered handler — any command/application-id pair other than
/// the four S6a commands this HSS serves — answer with
/// DIAMETER_COMMAND_UNSUPPORTED per the base protocol.
pub struct Dispatcher<S: SubscriberStore, C: Counters> {
    store: Arc<S>,
    counters: Arc<C>,
    peers: Arc<PeerRegistry<C>>,
    origin_host: String,
    origin_realm: String,
}

impl<S, C> Clone for Dispatcher<S, C>
where
    S: SubscriberStore,
    C: Counters,
{
    fn clone(&self) -> Self {
        Dispatcher {
            store: Arc::clone(&self.store),
            counters: Arc::clone(&self.counters),
            peers: Arc::clone(&self.peers),
            origin_host: self.origin_host.clone(),
            origin_realm: self.origin_realm.clone(),
        }
    }
}

impl<S, C> Dispatcher<S, C>
where
    S: SubscriberStore + 'static,
    C: Counters + 'static,
{
    pub fn new(
        store: Arc<S>,
        counters: Arc<C>,
        peers: Arc<PeerRegistry<C>>,
        origin_host: impl Into<String>,
        origin_realm: impl Into<String>,
    ) -> Dispatcher<S, C> {
        Dispatcher {
            store,
            counters,
            peers,
            origin_host: origin_host.into(),
            origin_realm: origin_realm.into(),
        }
    }

    pub async fn dispatch(&self, req: DiameterMessage) -> Result<DiameterMessage> {
        let answer = match (req.get_application_id(), req.get_command_code()) {
            (ApplicationId::S6a, CommandCode::AuthenticationInformation) => {
                handlers::air::handle(&req, &*self.store, &*self.counters, &self.origin_host, &self.origin_realm)
                    .await
            }
            (ApplicationId::S6a, CommandCode::UpdateLocation) => {
                handlers::ulr::handle(
                    &req,
                    &*self.store,
                    &*self.counters,
                    &self.peers,
                    &self.origin_host,
                    &self.origin_realm,
                )
                .await
            }
            (ApplicationId::S6a, CommandCode::PurgeUE) => {
                handlers::pur::handle(&req, &*self.store, &*self.counters, &self.origin_host, &self.origin_realm)
                    .await
            }
            (ApplicationId::S6a, CommandCode::Notify) => {
                handlers::nor::handle(&req, &*self.store, &*self.counters, &self.origin_host, &self.origin_realm)
                    .await
            }
            _ => command_unsupported(&req),
        };
        Ok(answer)
    }
}

fn command_unsupported(req: &DiameterMessage) -> DiameterMessage {
    let mut ans = DiameterMessage::new_answer(req);
    ans.add_avp(avp!(268, None, M, Unsigned32::new(DIAMETER_COMMAND_UNSUPPORTED)));
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    #[test]
    fn test_end_to_end_id_monotone() {
        let gen = EndToEndIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_eq!(b, a + 1);
    }

    #[tokio::test]
    async fn test_command_unsupported_for_unknown_command() {
        let dict = Arc::new(Dictionary::new(&[&dictionary::DEFAULT_DICT_XML]));
        let req = DiameterMessage::new(
            CommandCode::Unknown(999),
            ApplicationId::S6a,
            flags::REQUEST,
            1,
            1,
            dict,
        );
        let ans = command_unsupported(&req);
        assert_eq!(
            ans.get_avp(268).unwrap().get_unsigned32().unwrap(),
            DIAMETER_COMMAND_UNSUPPORTED
        );
    }
}
