//! Upstream creation payload built from a completed wizard state.

use serde_json::{json, Map, Value};

use super::state::{Plan, WizardState};

/// Build the JSON body for `POST /v1/instances`.
///
/// Optional fields are omitted rather than sent as null or zero; the
/// provisioning API treats absence as "use the default". serde_json
/// object maps keep key order stable, so the same state always yields
/// the same body.
pub fn creation_payload(state: &WizardState) -> Value {
    let mut payload = json!({
        "hostnames": state.hostnames,
        "region": state.region,
        "class": state.instance_class,
        "assignIpv4": state.assign_ipv4,
        "assignIpv6": state.assign_ipv6,
    });

    if let Some(ref os_id) = state.os_id {
        payload["osId"] = Value::from(os_id.clone());
    }
    if state.floating_ip_count > 0 {
        payload["floatingIPCount"] = Value::from(state.floating_ip_count);
    }
    if !state.ssh_key_ids.is_empty() {
        payload["sshKeyIds"] = Value::from(state.ssh_key_ids.clone());
    }

    match &state.plan {
        Plan::Fixed {
            product_id,
            extra_disk_gb,
            extra_bandwidth_tb,
        } => {
            payload["productId"] = Value::from(product_id.clone());
            let mut extras = Map::new();
            if *extra_disk_gb > 0 {
                extras.insert("diskInGB".into(), Value::from(*extra_disk_gb));
            }
            if *extra_bandwidth_tb > 0 {
                extras.insert("bandwidthInTB".into(), Value::from(*extra_bandwidth_tb));
            }
            if !extras.is_empty() {
                payload["extraResource"] = Value::Object(extras);
            }
        }
        Plan::Custom {
            cpu,
            ram_gb,
            disk_gb,
            bandwidth_tb,
        } => {
            let mut extras = Map::new();
            extras.insert("cpu".into(), Value::from(*cpu));
            extras.insert("ramInGB".into(), Value::from(*ram_gb));
            extras.insert("diskInGB".into(), Value::from(*disk_gb));
            if let Some(bw) = bandwidth_tb {
                extras.insert("bandwidthInTB".into(), Value::from(*bw));
            }
            payload["extraResource"] = Value::Object(extras);
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_state() -> WizardState {
        WizardState {
            hostnames: vec!["web-1".into()],
            region: "ams1".into(),
            ..WizardState::default()
        }
    }

    #[test]
    fn fixed_plan_payload_carries_product_and_extras() {
        let mut state = base_state();
        state.plan = Plan::Fixed {
            product_id: "vps-2".into(),
            extra_disk_gb: 40,
            extra_bandwidth_tb: 0,
        };
        state.os_id = Some("u22".into());
        state.ssh_key_ids = vec![42, 7];
        state.floating_ip_count = 2;

        let payload = creation_payload(&state);
        assert_eq!(payload["hostnames"], json!(["web-1"]));
        assert_eq!(payload["region"], "ams1");
        assert_eq!(payload["productId"], "vps-2");
        assert_eq!(payload["extraResource"], json!({"diskInGB": 40}));
        assert_eq!(payload["osId"], "u22");
        assert_eq!(payload["sshKeyIds"], json!([42, 7]));
        assert_eq!(payload["floatingIPCount"], 2);
        assert_eq!(payload["assignIpv4"], true);
        assert_eq!(payload["assignIpv6"], false);
    }

    #[test]
    fn fixed_plan_without_extras_omits_extra_resource() {
        let mut state = base_state();
        state.plan = Plan::Fixed {
            product_id: "vps-1".into(),
            extra_disk_gb: 0,
            extra_bandwidth_tb: 0,
        };
        let payload = creation_payload(&state);
        assert!(payload.get("extraResource").is_none());
        assert!(payload.get("floatingIPCount").is_none());
        assert!(payload.get("sshKeyIds").is_none());
        assert!(payload.get("osId").is_none());
    }

    #[test]
    fn custom_plan_payload_always_carries_resources() {
        let mut state = base_state();
        state.plan = Plan::Custom {
            cpu: 2,
            ram_gb: 4,
            disk_gb: 20,
            bandwidth_tb: None,
        };
        let payload = creation_payload(&state);
        assert!(payload.get("productId").is_none());
        assert_eq!(
            payload["extraResource"],
            json!({"cpu": 2, "ramInGB": 4, "diskInGB": 20})
        );

        state.plan = Plan::Custom {
            cpu: 2,
            ram_gb: 4,
            disk_gb: 20,
            bandwidth_tb: Some(3),
        };
        let payload = creation_payload(&state);
        assert_eq!(payload["extraResource"]["bandwidthInTB"], 3);
    }
}
