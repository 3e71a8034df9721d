//! A runnable HSS process: wires [`Config`], the in-memory subscriber store
//! and counters adapters, the peer registry and dispatcher, and the
//! transport-layer `DiameterServer` into a single Diameter S6a endpoint.
//!
//! `subscriber_store`/`counter_store` in the config name a production
//! backend's connection string; only the in-memory reference adapters are
//! implemented here (§6), so this demo ignores their value beyond logging it.
//! CER/CEA and DWR/DWA are answered inline, the way the teacher crate's own
//! `examples/server.rs` answers CapabilitiesExchange before handing off to
//! an application-specific dispatcher.

use chrono::Local;
use diameter::avp::flags::M;
use diameter::avp::{Identity, Unsigned32, UTF8String};
use diameter::dictionary::{self, Dictionary};
use diameter::flags;
use diameter::hss::config::Config;
use diameter::hss::counters::InMemoryCounters;
use diameter::hss::peer::{Dispatcher, PeerRegistry};
use diameter::hss::result_code::DIAMETER_SUCCESS;
use diameter::hss::store::InMemoryStore;
use diameter::transport::{DiameterServer, DiameterServerConfig};
use diameter::CommandCode;
use diameter::DiameterMessage;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::thread;

const FIRMWARE_REVISION: u32 = 1;

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .format(|buf, record| {
            let now = Local::now();
            let thread = thread::current();
            writeln!(
                buf,
                "{} [{}] {:?} - ({}): {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                thread.id(),
                thread.name().unwrap_or("unnamed"),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();

    let toml = std::fs::read_to_string(
        std::env::args().nth(1).unwrap_or_else(|| "hss.toml".into()),
    )
    .expect("failed to read config file");
    let config = Config::load(&toml).expect("invalid config");
    log::info!(
        "configured subscriber_store={} counter_store={} (in-memory adapters used instead)",
        config.subscriber_store,
        config.counter_store
    );

    let dict = Arc::new(Dictionary::new(&[&dictionary::DEFAULT_DICT_XML]));
    let store = Arc::new(InMemoryStore::new());
    let counters = Arc::new(InMemoryCounters::new());

    let dial_addresses: HashMap<String, String> = config
        .peers
        .iter()
        .map(|p| (p.hostname.clone(), p.addr.clone()))
        .collect();
    let peers = Arc::new(PeerRegistry::new(
        config.node.hostname.clone(),
        config.node.realm.clone(),
        Arc::clone(&dict),
        Arc::clone(&counters),
        dial_addresses,
    ));

    let dispatcher = Dispatcher::new(
        Arc::clone(&store),
        Arc::clone(&counters),
        Arc::clone(&peers),
        config.node.hostname.clone(),
        config.node.realm.clone(),
    );

    let server_config = DiameterServerConfig { native_tls: None };
    let mut server = DiameterServer::new(&config.node.listen_addr, server_config)
        .await
        .expect("failed to bind listen_addr");
    log::info!("Listening at {}", config.node.listen_addr);

    let dict_ref = Arc::clone(&dict);
    let hostname = config.node.hostname.clone();
    let realm = config.node.realm.clone();
    server
        .listen(
            move |req| {
                let dispatcher = dispatcher.clone();
                let hostname = hostname.clone();
                let realm = realm.clone();
                async move {
                    log::info!("Received request: {}", req);
                    let res = match req.get_command_code() {
                        CommandCode::CapabilitiesExchange => {
                            capabilities_exchange_answer(&req, &hostname, &realm)
                        }
                        CommandCode::DeviceWatchdog => device_watchdog_answer(&req, &hostname, &realm),
                        CommandCode::DisconnectPeer => disconnect_peer_answer(&req, &hostname, &realm),
                        _ => dispatcher.dispatch(req).await?,
                    };
                    Ok(res)
                }
            },
            dict_ref,
        )
        .await
        .expect("server loop exited");
}

fn capabilities_exchange_answer(req: &DiameterMessage, hostname: &str, realm: &str) -> DiameterMessage {
    let mut ans = DiameterMessage::new_answer(req);
    ans.add_avp(diameter::avp!(264, None, M, Identity::new(hostname)));
    ans.add_avp(diameter::avp!(296, None, M, Identity::new(realm)));
    ans.add_avp(diameter::avp!(266, None, M, Unsigned32::new(10415)));
    ans.add_avp(diameter::avp!(269, None, M, UTF8String::new("diameter-hss")));
    ans.add_avp(diameter::avp!(267, None, M, Unsigned32::new(FIRMWARE_REVISION)));
    ans.add_avp(diameter::avp!(268, None, M, Unsigned32::new(DIAMETER_SUCCESS)));
    ans
}

fn device_watchdog_answer(req: &DiameterMessage, hostname: &str, realm: &str) -> DiameterMessage {
    let mut ans = DiameterMessage::new_answer(req);
    ans.add_avp(diameter::avp!(264, None, M, Identity::new(hostname)));
    ans.add_avp(diameter::avp!(296, None, M, Identity::new(realm)));
    ans.add_avp(diameter::avp!(268, None, M, Unsigned32::new(DIAMETER_SUCCESS)));
    ans
}

fn disconnect_peer_answer(req: &DiameterMessage, hostname: &str, realm: &str) -> DiameterMessage {
    let mut ans = DiameterMessage::new_answer(req);
    ans.add_avp(diameter::avp!(264, None, M, Identity::new(hostname)));
    ans.add_avp(diameter::avp!(296, None, M, Identity::new(realm)));
    ans.add_avp(diameter::avp!(268, None, M, Unsigned32::new(DIAMETER_SUCCESS)));
    ans
}
