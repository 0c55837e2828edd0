//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the monitor server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `4500`; `0` auto-assigns).
    pub port: u16,
    /// Execution slots for blocking collector calls.
    pub pool_slots: usize,
    /// Seconds a registered worker may stay unclaimed before recycling.
    pub claim_ttl_secs: u64,
    /// Per-session outbound frame queue depth.
    pub send_queue: usize,
    /// Network interface to stream; first non-loopback when unset.
    pub nic: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4500,
            pool_slots: 16,
            claim_ttl_secs: 3,
            send_queue: 64,
            nic: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 4500);
    }

    #[test]
    fn default_pool_slots() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.pool_slots, 16);
    }

    #[test]
    fn default_claim_ttl() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.claim_ttl_secs, 3);
    }

    #[test]
    fn default_send_queue() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.send_queue, 64);
    }

    #[test]
    fn default_nic_is_unset() {
        let cfg = ServerConfig::default();
        assert!(cfg.nic.is_none());
    }

    #[test]
    fn serde_round_trip() {
        let cfg = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9000,
            pool_slots: 4,
            claim_ttl_secs: 10,
            send_queue: 8,
            nic: Some("eth0".into()),
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.pool_slots, cfg.pool_slots);
        assert_eq!(back.claim_ttl_secs, cfg.claim_ttl_secs);
        assert_eq!(back.send_queue, cfg.send_queue);
        assert_eq!(back.nic, cfg.nic);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"10.0.0.1","port":3000,"pool_slots":2,"claim_ttl_secs":5,"send_queue":16,"nic":null}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "10.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.pool_slots, 2);
    }
}
