//! Query-string codec for [`WizardState`].
//!
//! `decode` is total: whatever arrives in the URL, it produces a state,
//! substituting documented defaults for anything missing or malformed.
//! `encode` emits a stable field order so equal states produce equal
//! URLs. Every wizard link, redirect, and hidden form field goes
//! through [`step_url`] / [`preserved_url`] / [`hidden_pairs`] — there
//! is no second place query strings are assembled.

use urlencoding::{decode as url_decode, encode as url_encode};

use super::state::{Plan, WizardState, MAX_FLOATING_IPS};
use super::steps::Step;

/// Every parameter the wizard reads or writes, in encode order.
pub const FIELD_NAMES: &[&str] = &[
    "hostnames",
    "region",
    "instance_class",
    "plan_type",
    "assign_ipv4",
    "assign_ipv6",
    "floating_ip_count",
    "product_id",
    "extra_disk_gb",
    "extra_bandwidth_tb",
    "cpu",
    "ram_gb",
    "disk_gb",
    "bandwidth_tb",
    "ssh_key_ids",
    "os_id",
];

/// An ordered multimap over decoded query or form pairs. Axum's map
/// extractors keep one value per name; the wizard needs all of them,
/// in order, for its repeated fields.
#[derive(Debug, Clone, Default)]
pub struct QueryMap {
    pairs: Vec<(String, String)>,
}

impl QueryMap {
    /// Parse a raw query string or form-encoded body. `+` means space
    /// in this encoding; percent sequences that fail to decode are
    /// kept verbatim.
    pub fn parse(raw: &str) -> QueryMap {
        let mut pairs = Vec::new();
        for piece in raw.split('&') {
            if piece.is_empty() {
                continue;
            }
            let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
            pairs.push((decode_component(key), decode_component(value)));
        }
        QueryMap { pairs }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> QueryMap
    where
        K: Into<String>,
        V: Into<String>,
    {
        QueryMap {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name`, in arrival order.
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match url_decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Rebuild a state from query parameters. Total: never fails.
///
/// Defaults: no hostnames, empty region, class "default", fixed plan
/// with empty product, IPv4 on, IPv6 off, no floating IPs, no keys, no
/// OS. `floating_ip_count` clamps into [0,5]; custom bandwidth below 1
/// reads as absent; other overlay numbers floor at 0.
pub fn decode(query: &QueryMap) -> WizardState {
    let plan = if is_custom_token(query.first("plan_type")) {
        Plan::Custom {
            cpu: non_negative(query.first("cpu")),
            ram_gb: non_negative(query.first("ram_gb")),
            disk_gb: non_negative(query.first("disk_gb")),
            bandwidth_tb: parse_int(query.first("bandwidth_tb")).filter(|bw| *bw >= 1),
        }
    } else {
        Plan::Fixed {
            product_id: trimmed(query.first("product_id")),
            extra_disk_gb: non_negative(query.first("extra_disk_gb")),
            extra_bandwidth_tb: non_negative(query.first("extra_bandwidth_tb")),
        }
    };

    let instance_class = {
        let value = trimmed(query.first("instance_class"));
        if value.is_empty() {
            "default".to_string()
        } else {
            value
        }
    };

    let os_id = {
        let value = trimmed(query.first("os_id"));
        (!value.is_empty()).then_some(value)
    };

    WizardState {
        hostnames: list_values(query, "hostnames"),
        region: trimmed(query.first("region")),
        instance_class,
        plan,
        assign_ipv4: parse_flag(query.first("assign_ipv4"), true),
        assign_ipv6: parse_flag(query.first("assign_ipv6"), false),
        floating_ip_count: parse_int(query.first("floating_ip_count"))
            .unwrap_or(0)
            .clamp(0, MAX_FLOATING_IPS),
        ssh_key_ids: parse_id_list(&list_values(query, "ssh_key_ids")),
        os_id,
    }
}

/// Emit the state as ordered pairs. Multi-valued fields repeat the
/// name; booleans encode as "1"/"0"; empty strings and absent
/// optionals are omitted. Only the active plan overlay appears.
pub fn encode(state: &WizardState) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut push = |name: &str, value: String| pairs.push((name.to_string(), value));

    for hostname in &state.hostnames {
        push("hostnames", hostname.clone());
    }
    if !state.region.is_empty() {
        push("region", state.region.clone());
    }
    push("instance_class", state.instance_class.clone());
    push("plan_type", state.plan.type_token().to_string());
    push("assign_ipv4", flag_token(state.assign_ipv4));
    push("assign_ipv6", flag_token(state.assign_ipv6));
    push("floating_ip_count", state.floating_ip_count.to_string());

    match &state.plan {
        Plan::Fixed {
            product_id,
            extra_disk_gb,
            extra_bandwidth_tb,
        } => {
            if !product_id.is_empty() {
                push("product_id", product_id.clone());
            }
            push("extra_disk_gb", extra_disk_gb.to_string());
            push("extra_bandwidth_tb", extra_bandwidth_tb.to_string());
        }
        Plan::Custom {
            cpu,
            ram_gb,
            disk_gb,
            bandwidth_tb,
        } => {
            push("cpu", cpu.to_string());
            push("ram_gb", ram_gb.to_string());
            push("disk_gb", disk_gb.to_string());
            if let Some(bw) = bandwidth_tb {
                push("bandwidth_tb", bw.to_string());
            }
        }
    }

    for id in &state.ssh_key_ids {
        push("ssh_key_ids", id.to_string());
    }
    if let Some(os_id) = &state.os_id {
        push("os_id", os_id.clone());
    }
    pairs
}

/// Percent-encode pairs into a query string.
pub fn query_string(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&url_encode(key));
        out.push('=');
        out.push_str(&url_encode(value));
    }
    out
}

/// The URL for `step` carrying `state`. The single place wizard URLs
/// are built.
pub fn step_url(step: Step, state: &WizardState) -> String {
    let query = query_string(&encode(state));
    if query.is_empty() {
        step.path().to_string()
    } else {
        format!("{}?{}", step.path(), query)
    }
}

/// The URL for `step` carrying the submitted pairs verbatim (filtered
/// to known fields). Used when validation fails, so the operator gets
/// their raw input back — including values the codec would normalize
/// away.
pub fn preserved_url(step: Step, query: &QueryMap) -> String {
    let pairs: Vec<(String, String)> = query
        .pairs()
        .iter()
        .filter(|(key, _)| FIELD_NAMES.contains(&key.as_str()))
        .cloned()
        .collect();
    let qs = query_string(&pairs);
    if qs.is_empty() {
        step.path().to_string()
    } else {
        format!("{}?{}", step.path(), qs)
    }
}

/// Encoded pairs minus the fields a step's form edits itself; rendered
/// as hidden inputs so submissions carry the rest of the state.
pub fn hidden_pairs(state: &WizardState, exclude: &[&str]) -> Vec<(String, String)> {
    encode(state)
        .into_iter()
        .filter(|(key, _)| !exclude.contains(&key.as_str()))
        .collect()
}

/// Truthy tokens: 1, true, yes, on (any case). Empty input keeps the
/// default.
pub fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(raw) => {
            let token = raw.trim().to_lowercase();
            if token.is_empty() {
                default
            } else {
                matches!(token.as_str(), "1" | "true" | "yes" | "on")
            }
        }
        None => default,
    }
}

pub fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|raw| raw.trim().parse::<i64>().ok())
}

/// Anything but an explicit "custom" token means the fixed branch.
fn is_custom_token(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("custom"))
        .unwrap_or(false)
}

fn non_negative(value: Option<&str>) -> i64 {
    parse_int(value).map(|n| n.max(0)).unwrap_or(0)
}

fn flag_token(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// All values for a repeated field, each additionally split on commas
/// and newlines so textarea input works, trimmed, empties dropped.
fn list_values(query: &QueryMap, name: &str) -> Vec<String> {
    let mut out = Vec::new();
    for value in query.all(name) {
        for piece in value.split(|c| c == ',' || c == '\n' || c == '\r') {
            let piece = piece.trim();
            if !piece.is_empty() {
                out.push(piece.to_string());
            }
        }
    }
    out
}

/// Integer ids: non-numeric tokens silently dropped, duplicates keep
/// their first position.
pub fn parse_id_list(values: &[String]) -> Vec<i64> {
    let mut out = Vec::new();
    for value in values {
        if let Ok(id) = value.trim().parse::<i64>() {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_state() -> WizardState {
        WizardState {
            hostnames: vec!["web-1".into(), "web-2".into()],
            region: "ams1".into(),
            instance_class: "default".into(),
            plan: Plan::Custom {
                cpu: 2,
                ram_gb: 4,
                disk_gb: 20,
                bandwidth_tb: Some(2),
            },
            assign_ipv4: true,
            assign_ipv6: true,
            floating_ip_count: 1,
            ssh_key_ids: vec![42, 7],
            os_id: Some("ubuntu-22".into()),
        }
    }

    #[test]
    fn round_trip_custom_plan() {
        let state = custom_state();
        let query = QueryMap::from_pairs(encode(&state));
        assert_eq!(decode(&query), state);
    }

    #[test]
    fn round_trip_fixed_plan() {
        let state = WizardState {
            hostnames: vec!["db-1".into()],
            region: "nyc1".into(),
            plan: Plan::Fixed {
                product_id: "vps-4".into(),
                extra_disk_gb: 50,
                extra_bandwidth_tb: 0,
            },
            ..WizardState::default()
        };
        let query = QueryMap::from_pairs(encode(&state));
        assert_eq!(decode(&query), state);
    }

    #[test]
    fn round_trip_survives_url_encoding() {
        let state = custom_state();
        let reparsed = QueryMap::parse(&query_string(&encode(&state)));
        assert_eq!(decode(&reparsed), state);
    }

    #[test]
    fn encode_is_deterministic_and_ordered() {
        let state = custom_state();
        let a = encode(&state);
        let b = encode(&state);
        assert_eq!(a, b);
        let names: Vec<&str> = a.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "hostnames",
                "hostnames",
                "region",
                "instance_class",
                "plan_type",
                "assign_ipv4",
                "assign_ipv6",
                "floating_ip_count",
                "cpu",
                "ram_gb",
                "disk_gb",
                "bandwidth_tb",
                "ssh_key_ids",
                "ssh_key_ids",
                "os_id",
            ]
        );
    }

    #[test]
    fn decode_of_nothing_is_the_default_state() {
        assert_eq!(decode(&QueryMap::parse("")), WizardState::default());
    }

    #[test]
    fn decode_never_fails_on_garbage() {
        let query = QueryMap::parse(
            "hostnames=&region=ams1&plan_type=banana&cpu=lots&floating_ip_count=ninetynine\
             &assign_ipv4=maybe&ssh_key_ids=alpha&ssh_key_ids=9&bandwidth_tb=-3&%zz=%zz",
        );
        let state = decode(&query);
        assert!(state.hostnames.is_empty());
        assert_eq!(state.region, "ams1");
        // unknown plan token coerces to fixed
        assert!(state.plan.is_fixed());
        assert_eq!(state.floating_ip_count, 0);
        assert!(!state.assign_ipv4);
        assert_eq!(state.ssh_key_ids, vec![9]);
    }

    #[test]
    fn floating_ip_count_clamps_into_range() {
        let high = decode(&QueryMap::parse("floating_ip_count=9"));
        let low = decode(&QueryMap::parse("floating_ip_count=-2"));
        assert_eq!(high.floating_ip_count, 5);
        assert_eq!(low.floating_ip_count, 0);
    }

    #[test]
    fn truthy_tokens_accepted_case_insensitively() {
        for token in ["1", "true", "YES", "On"] {
            assert!(parse_flag(Some(token), false), "token {token}");
        }
        for token in ["0", "false", "no", "off", "2", "anything"] {
            assert!(!parse_flag(Some(token), true), "token {token}");
        }
        assert!(parse_flag(None, true));
        assert!(parse_flag(Some("  "), true));
    }

    #[test]
    fn hostnames_accept_repeats_and_csv() {
        let query = QueryMap::parse("hostnames=web-1%2Cweb-2&hostnames=db-1&hostnames=++");
        let state = decode(&query);
        assert_eq!(state.hostnames, vec!["web-1", "web-2", "db-1"]);
    }

    #[test]
    fn ssh_ids_drop_non_numeric_and_duplicates() {
        let query = QueryMap::parse("ssh_key_ids=42&ssh_key_ids=abc&ssh_key_ids=7&ssh_key_ids=42");
        assert_eq!(decode(&query).ssh_key_ids, vec![42, 7]);
    }

    #[test]
    fn custom_bandwidth_below_one_reads_as_absent() {
        let query = QueryMap::parse("plan_type=custom&cpu=1&ram_gb=2&disk_gb=20&bandwidth_tb=0");
        match decode(&query).plan {
            Plan::Custom { bandwidth_tb, .. } => assert_eq!(bandwidth_tb, None),
            other => panic!("expected custom plan, got {other:?}"),
        }
    }

    #[test]
    fn overlay_fields_of_the_inactive_branch_are_ignored() {
        // A rewritten URL mixing both overlays: plan_type picks one.
        let query =
            QueryMap::parse("plan_type=fixed&product_id=vps-2&cpu=8&ram_gb=64&disk_gb=500");
        let state = decode(&query);
        assert_eq!(
            state.plan,
            Plan::Fixed {
                product_id: "vps-2".into(),
                extra_disk_gb: 0,
                extra_bandwidth_tb: 0
            }
        );
    }

    #[test]
    fn step_url_carries_the_whole_state() {
        let url = step_url(Step::Review, &custom_state());
        assert!(url.starts_with("/create/review?"));
        assert!(url.contains("hostnames=web-1"));
        assert!(url.contains("os_id=ubuntu-22"));
    }

    #[test]
    fn preserved_url_keeps_raw_values_and_drops_unknown_fields() {
        let query = QueryMap::parse("cpu=lots&ram_gb=1&utm_source=ads&plan_type=custom");
        let url = preserved_url(Step::Plan, &query);
        assert!(url.contains("cpu=lots"));
        assert!(url.contains("ram_gb=1"));
        assert!(!url.contains("utm_source"));
    }

    #[test]
    fn hidden_pairs_exclude_fields_a_form_edits() {
        let pairs = hidden_pairs(&custom_state(), &["cpu", "ram_gb", "disk_gb", "bandwidth_tb"]);
        assert!(pairs.iter().all(|(k, _)| k != "cpu"));
        assert!(pairs.iter().any(|(k, _)| k == "hostnames"));
    }

    #[test]
    fn plus_and_percent_decode_in_form_bodies() {
        let query = QueryMap::parse("instance_class=high+frequency&region=ams%2D1");
        assert_eq!(query.first("instance_class"), Some("high frequency"));
        assert_eq!(query.first("region"), Some("ams-1"));
    }
}
