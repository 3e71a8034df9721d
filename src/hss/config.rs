//! Process-wide configuration (§6), loaded once at startup from a TOML file
//! via `serde`. Static for the lifetime of the process; a reload requires a
//! restart — the same lifecycle the teacher crate's peer/transport layer
//! already assumes for its own addresses.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::sync::OnceLock;

/// The transport a peer is reached over. Only `Tcp` is implemented; `Sctp`
/// is named for forward-compatibility (Non-goals, §1) and is rejected at
/// config-load time if selected, rather than silently falling back to TCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Sctp,
}

/// This HSS's own Diameter node identity and listen address.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub hostname: String,
    pub realm: String,
    pub listen_addr: String,
    #[serde(default = "default_application_ids")]
    pub application_ids: Vec<u32>,
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u32,
}

fn default_application_ids() -> Vec<u32> {
    vec![16777251]
}

fn default_vendor_id() -> u32 {
    10415
}

/// One configured peer (an MME/SGSN this HSS will dial or accept from).
#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfig {
    pub hostname: String,
    pub realm: String,
    pub addr: String,
    #[serde(default = "default_transport")]
    pub transport: Transport,
}

fn default_transport() -> Transport {
    Transport::Tcp
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    pub subscriber_store: String,
    pub counter_store: String,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    /// Parses `toml`, rejecting any peer configured for `Sctp` (Non-goals,
    /// §1 — SCTP transport is not implemented).
    pub fn parse(toml: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(toml).map_err(|e| Error::ConfigError(format!("{}", e)))?;
        if let Some(peer) = config.peers.iter().find(|p| p.transport == Transport::Sctp) {
            return Err(Error::ConfigError(format!(
                "peer {} configured for Sctp, which this build does not implement",
                peer.hostname
            )));
        }
        Ok(config)
    }

    /// Loads the process-wide config from `toml` and installs it as the
    /// global [`Config::get`] singleton. Must be called at most once per
    /// process; a second call returns an error rather than silently
    /// replacing the already-running configuration (reloads require a
    /// restart, §6).
    pub fn load(toml: &str) -> Result<&'static Config> {
        let config = Config::parse(toml)?;
        CONFIG
            .set(config)
            .map_err(|_| Error::ConfigError("Config::load called more than once".into()))?;
        Ok(CONFIG.get().expect("just set"))
    }

    /// The process-wide config installed by [`Config::load`]. Panics if
    /// called before `load` — every entry point (the server binary, an
    /// integration test harness) is expected to load it first.
    pub fn get() -> &'static Config {
        CONFIG.get().expect("Config::load was not called")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        subscriber_store = "postgres://localhost/hss"
        counter_store = "redis://localhost"

        [node]
        hostname = "hss1.epc.mnc001.mcc001.3gppnetwork.org"
        realm = "epc.mnc001.mcc001.3gppnetwork.org"
        listen_addr = "0.0.0.0:3868"

        [[peers]]
        hostname = "mme1.epc.mnc001.mcc001.3gppnetwork.org"
        realm = "epc.mnc001.mcc001.3gppnetwork.org"
        addr = "10.0.0.1:3868"
    "#;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.node.hostname, "hss1.epc.mnc001.mcc001.3gppnetwork.org");
        assert_eq!(config.node.application_ids, vec![16777251]);
        assert_eq!(config.node.vendor_id, 10415);
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peers[0].transport, Transport::Tcp);
    }

    #[test]
    fn test_rejects_sctp_peer() {
        let toml = format!(
            "{}\n",
            SAMPLE.replace(
                "addr = \"10.0.0.1:3868\"",
                "addr = \"10.0.0.1:3868\"\ntransport = \"sctp\""
            )
        );
        assert!(Config::parse(&toml).is_err());
    }
}
