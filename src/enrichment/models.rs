//! JSON shapes returned by the Netdisco API.
//!
//! Responses are parsed leniently from `serde_json::Value`: deployments differ
//! in which fields they include, and a missing field only leaves the
//! corresponding location value unresolved.

use serde_json::Value;

use crate::core::record::LocationInfo;

/// Find the login token: top-level `api_key` first, then any nested object.
pub fn find_api_key(body: &Value) -> Option<String> {
    if let Some(key) = body.get("api_key").and_then(json_text) {
        return Some(key);
    }
    match body {
        Value::Object(map) => map.values().find_map(find_api_key),
        Value::Array(items) => items.iter().find_map(find_api_key),
        _ => None,
    }
}

/// Extract the first IP entry and first sighting of a node search.
pub fn parse_node_search(body: &Value) -> LocationInfo {
    let ip = first(body, "ips");
    let sighting = first(body, "sightings");

    LocationInfo {
        ip_address: ip.and_then(|v| v.get("ip")).and_then(json_text),
        router_ip: ip.and_then(|v| v.get("router_ip")).and_then(json_text),
        switch_hostname: sighting
            .and_then(|v| v.get("device"))
            .and_then(|d| d.get("name"))
            .and_then(json_text),
        switch_ip: sighting.and_then(|v| v.get("switch")).and_then(json_text),
        switch_port: sighting.and_then(|v| v.get("port")).and_then(json_text),
    }
}

fn first<'a>(body: &'a Value, array: &str) -> Option<&'a Value> {
    body.get(array)?.as_array()?.first()
}

/// Strings and numbers as text; null, empty strings and containers are absent.
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_api_key_top_level() {
        assert_eq!(
            find_api_key(&json!({"api_key": "abc123"})).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_find_api_key_nested() {
        let body = json!({"status": "ok", "data": {"session": {"api_key": "nested"}}});
        assert_eq!(find_api_key(&body).as_deref(), Some("nested"));
    }

    #[test]
    fn test_find_api_key_missing_or_empty() {
        assert_eq!(find_api_key(&json!({"token": "x"})), None);
        assert_eq!(find_api_key(&json!({"api_key": ""})), None);
        assert_eq!(find_api_key(&json!({"api_key": null})), None);
    }

    #[test]
    fn test_parse_full_node_search() {
        let body = json!({
            "ips": [
                {"ip": "10.0.0.15", "router_ip": "10.0.0.1"},
                {"ip": "10.0.0.99", "router_ip": "10.0.0.1"}
            ],
            "sightings": [
                {"device": {"name": "access-sw-01"}, "switch": "10.0.255.10", "port": "Gi1/0/12"}
            ]
        });
        let info = parse_node_search(&body);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.15"));
        assert_eq!(info.router_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(info.switch_hostname.as_deref(), Some("access-sw-01"));
        assert_eq!(info.switch_ip.as_deref(), Some("10.0.255.10"));
        assert_eq!(info.switch_port.as_deref(), Some("Gi1/0/12"));
    }

    #[test]
    fn test_parse_missing_arrays_leaves_fields_unresolved() {
        let info = parse_node_search(&json!({"ips": [{"ip": "10.0.0.15"}]}));
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.15"));
        assert_eq!(info.router_ip, None);
        assert_eq!(info.switch_hostname, None);
        assert_eq!(info.switch_port, None);

        assert!(!parse_node_search(&json!({})).is_resolved());
        assert!(!parse_node_search(&json!({"ips": [], "sightings": []})).is_resolved());
    }

    #[test]
    fn test_parse_numeric_port_and_null_device() {
        let body = json!({"sightings": [{"device": null, "switch": "10.1.1.1", "port": 24}]});
        let info = parse_node_search(&body);
        assert_eq!(info.switch_port.as_deref(), Some("24"));
        assert_eq!(info.switch_hostname, None);
    }
}
