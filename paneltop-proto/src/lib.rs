//! Wire types for the tunnel-panel status API.
//!
//! The panel exposes three read-only JSON endpoints under `/status`; these
//! types mirror their response shapes exactly. Unknown fields are ignored so
//! newer panels stay compatible with older dashboards.

use serde::{Deserialize, Serialize};

/// Response of `GET /status`. Replaced wholesale on every successful poll;
/// there is no partial merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub system: SystemStatus,
    pub tunnels: PoolStats,
    pub nodes: PoolStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
}

/// Total/active counters, used for both tunnels and nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolStats {
    pub total: u64,
    pub active: u64,
}

/// Response of `GET /status/traffic`. Every field is optional: the panel
/// omits rates it could not measure, and consumers treat absent Mbps fields
/// as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrafficRates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_mbps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_mbps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_bytes_per_sec: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_bytes_per_sec: Option<u64>,
}

/// Response of `GET /status/version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_status() {
        let json = r#"{
            "system": {
                "cpu_percent": 42.3,
                "memory_percent": 61.0,
                "memory_total_gb": 15.6,
                "memory_used_gb": 9.5
            },
            "tunnels": {"total": 2, "active": 1},
            "nodes": {"total": 5, "active": 3}
        }"#;

        let status: StatusSnapshot = serde_json::from_str(json).expect("valid status");
        assert_eq!(status.system.cpu_percent, 42.3);
        assert_eq!(status.nodes.total, 5);
        assert_eq!(status.nodes.active, 3);
        assert_eq!(status.tunnels.total, 2);
        assert_eq!(status.tunnels.active, 1);
    }

    #[test]
    fn decode_traffic_full() {
        let json = r#"{
            "rx_bytes_per_sec": 131072,
            "tx_bytes_per_sec": 65536,
            "rx_mbps": 1.0486,
            "tx_mbps": 0.5243
        }"#;

        let rates: TrafficRates = serde_json::from_str(json).expect("valid traffic");
        assert_eq!(rates.rx_mbps, Some(1.0486));
        assert_eq!(rates.tx_mbps, Some(0.5243));
        assert_eq!(rates.rx_bytes_per_sec, Some(131072));
    }

    #[test]
    fn decode_traffic_missing_fields() {
        let rates: TrafficRates = serde_json::from_str(r#"{"tx_mbps": 0.25}"#).expect("valid");
        assert_eq!(rates.rx_mbps, None);
        assert_eq!(rates.tx_mbps, Some(0.25));

        let empty: TrafficRates = serde_json::from_str("{}").expect("valid");
        assert_eq!(empty.rx_mbps, None);
        assert_eq!(empty.tx_mbps, None);
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let json = r#"{
            "system": {
                "cpu_percent": 1.0,
                "memory_percent": 2.0,
                "memory_total_gb": 3.0,
                "memory_used_gb": 4.0,
                "load_avg": [0.5, 0.4, 0.3]
            },
            "tunnels": {"total": 0, "active": 0},
            "nodes": {"total": 0, "active": 0},
            "uptime_secs": 12345
        }"#;

        let status: StatusSnapshot = serde_json::from_str(json).expect("valid status");
        assert_eq!(status.system.memory_used_gb, 4.0);
    }

    #[test]
    fn decode_version() {
        let info: VersionInfo =
            serde_json::from_str(r#"{"version": "0.1.0"}"#).expect("valid version");
        assert_eq!(info.version, "0.1.0");
    }
}
