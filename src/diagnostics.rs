//! Diagnostics.
//! A JSON document describing the configuration, coordinator health and last data,
//! with credentials and identifiers redacted.
use serde_json::{Value, json};

use crate::coordinator::Snapshot;
use crate::core::config::Config;
use crate::services::GatewayData;

pub const REDACTED: &str = "**REDACTED**";

/// Collect diagnostics for the gateway described by `config`.
pub fn collect(config: &Config, snapshot: &Snapshot<GatewayData>) -> Value {
    json!({
        "config": {
            "homeassistant_url": config.homeassistant_url.as_str(),
            "homeassistant_token": REDACTED,
            "gateway_id": REDACTED,
            "use_local_api": config.use_local_api,
        },
        "coordinator": coordinator(config, snapshot),
    })
}

fn coordinator(config: &Config, snapshot: &Snapshot<GatewayData>) -> Value {
    let mut section = json!({
        "last_update_success": snapshot.is_usable(),
        "last_update_time": snapshot.last_success_at.map(|at| at.to_rfc3339()),
        "update_interval": config.update_interval().as_secs(),
        "consecutive_failures": snapshot.consecutive_failures,
        "health": snapshot.health,
        "reauth_required": snapshot.reauth_required,
    });
    let data = match snapshot.data.as_deref() {
        Some(data) => json!({
            "stats": {
                "current": data.stats.current,
                "totals": data.stats.totals,
            },
            "switch_state": data.switch_state,
            "mode": data.mode,
        }),
        None => json!({ "error": "No data available" }),
    };
    section["data"] = data;
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Health;
    use crate::entities::tests::{sample_data, snapshot};
    use chrono::{TimeZone, Utc};
    use reqwest::Url;
    use std::time::Duration;

    fn config() -> Config {
        Config {
            app_log: "info".into(),
            app_log_style: "auto".into(),
            homeassistant_url: Url::parse("http://localhost:8123").unwrap(),
            homeassistant_token: "secret-token".into(),
            gateway_id: "10060005A01B2C3D".into(),
            use_local_api: false,
            scan_interval: Duration::from_secs(60).into(),
            local_scan_interval: Duration::from_secs(10).into(),
            max_failures: 3,
            fetch_attempts: 1,
            fetch_retry_delay: Duration::from_secs(2).into(),
            command_settle_delay: Duration::from_secs(2).into(),
            setup_retry_interval: Duration::from_secs(30).into(),
        }
    }

    #[test]
    fn test_collect_redacts_credentials() {
        let diagnostics = collect(&config(), &snapshot(None, Health::Unavailable));

        let text = diagnostics.to_string();
        assert!(!text.contains("secret-token"));
        assert!(!text.contains("10060005A01B2C3D"));
        assert_eq!(diagnostics["config"]["homeassistant_token"], REDACTED);
        assert_eq!(diagnostics["config"]["gateway_id"], REDACTED);
    }

    #[test]
    fn test_collect_without_data() {
        let diagnostics = collect(&config(), &snapshot(None, Health::Unavailable));

        let coordinator = &diagnostics["coordinator"];
        assert_eq!(coordinator["last_update_success"], false);
        assert_eq!(coordinator["last_update_time"], Value::Null);
        assert_eq!(coordinator["update_interval"], 60);
        assert_eq!(coordinator["health"], "unavailable");
        assert_eq!(coordinator["data"], json!({ "error": "No data available" }));
    }

    #[test]
    fn test_collect_with_data() {
        let mut snapshot = snapshot(Some(sample_data()), Health::Available);
        snapshot.last_success_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());

        let diagnostics = collect(&config(), &snapshot);

        let coordinator = &diagnostics["coordinator"];
        assert_eq!(coordinator["last_update_success"], true);
        assert_eq!(coordinator["last_update_time"], "2024-06-01T12:00:00+00:00");
        assert_eq!(coordinator["health"], "available");
        assert_eq!(coordinator["data"]["stats"]["current"]["battery_soc"], 87.5);
        assert_eq!(coordinator["data"]["switch_state"], json!([true, false, true]));
        assert!(coordinator["data"]["stats"]["totals"].is_object());
    }
}
