/// Most hostnames one provisioning request may carry.
pub const MAX_HOSTNAMES: usize = 10;
/// Upper bound on floating IPs per request.
pub const MAX_FLOATING_IPS: i64 = 5;

/// The plan half of the wizard state. The variant decides which fields
/// exist at all, so a fixed product id can never coexist with custom
/// resource figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// A provider-defined product, optionally padded with extra disk
    /// or bandwidth.
    Fixed {
        product_id: String,
        extra_disk_gb: i64,
        extra_bandwidth_tb: i64,
    },
    /// Operator-chosen resources. Zeroes mean "not filled in yet";
    /// `bandwidth_tb` is `None` unless explicitly requested, and never
    /// below 1 when present.
    Custom {
        cpu: i64,
        ram_gb: i64,
        disk_gb: i64,
        bandwidth_tb: Option<i64>,
    },
}

impl Plan {
    pub fn blank_fixed() -> Plan {
        Plan::Fixed {
            product_id: String::new(),
            extra_disk_gb: 0,
            extra_bandwidth_tb: 0,
        }
    }

    pub fn blank_custom() -> Plan {
        Plan::Custom {
            cpu: 0,
            ram_gb: 0,
            disk_gb: 0,
            bandwidth_tb: None,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Plan::Fixed { .. })
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Plan::Custom { .. })
    }

    /// Wire token for the `plan_type` parameter.
    pub fn type_token(&self) -> &'static str {
        match self {
            Plan::Fixed { .. } => "fixed",
            Plan::Custom { .. } => "custom",
        }
    }

    /// Whether the overlay satisfies its own completeness rules.
    /// Region-specific minimums are the validator's business, not ours.
    pub fn is_complete(&self) -> bool {
        match self {
            Plan::Fixed { product_id, extra_disk_gb, extra_bandwidth_tb } => {
                !product_id.is_empty() && *extra_disk_gb >= 0 && *extra_bandwidth_tb >= 0
            }
            Plan::Custom { cpu, ram_gb, disk_gb, bandwidth_tb } => {
                *cpu >= 1
                    && *ram_gb >= 1
                    && *disk_gb >= 1
                    && bandwidth_tb.map_or(true, |bw| bw >= 1)
            }
        }
    }

    /// RAM chosen on the custom branch; `None` on the fixed branch,
    /// where RAM comes from the product's specification instead.
    pub fn custom_ram_gb(&self) -> Option<i64> {
        match self {
            Plan::Custom { ram_gb, .. } if *ram_gb >= 1 => Some(*ram_gb),
            _ => None,
        }
    }
}

/// Everything the operator has chosen so far, rebuilt from the query
/// string on every request and never stored server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub hostnames: Vec<String>,
    pub region: String,
    pub instance_class: String,
    pub plan: Plan,
    pub assign_ipv4: bool,
    pub assign_ipv6: bool,
    pub floating_ip_count: i64,
    pub ssh_key_ids: Vec<i64>,
    pub os_id: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        WizardState {
            hostnames: Vec::new(),
            region: String::new(),
            instance_class: "default".to_string(),
            plan: Plan::blank_fixed(),
            assign_ipv4: true,
            assign_ipv6: false,
            floating_ip_count: 0,
            ssh_key_ids: Vec::new(),
            os_id: None,
        }
    }
}

impl WizardState {
    /// Hostnames and region chosen.
    pub fn step1_complete(&self) -> bool {
        !self.hostnames.is_empty() && !self.region.is_empty()
    }

    pub fn plan_complete(&self) -> bool {
        self.plan.is_complete()
    }

    pub fn os_selected(&self) -> bool {
        self.os_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_plans_are_incomplete() {
        assert!(!Plan::blank_fixed().is_complete());
        assert!(!Plan::blank_custom().is_complete());
    }

    #[test]
    fn fixed_plan_needs_only_a_product() {
        let plan = Plan::Fixed {
            product_id: "vps-2".into(),
            extra_disk_gb: 0,
            extra_bandwidth_tb: 0,
        };
        assert!(plan.is_complete());
        assert!(plan.custom_ram_gb().is_none());
    }

    #[test]
    fn custom_plan_needs_all_three_resources() {
        let mut plan = Plan::Custom {
            cpu: 2,
            ram_gb: 4,
            disk_gb: 20,
            bandwidth_tb: None,
        };
        assert!(plan.is_complete());
        assert_eq!(plan.custom_ram_gb(), Some(4));
        if let Plan::Custom { ram_gb, .. } = &mut plan {
            *ram_gb = 0;
        }
        assert!(!plan.is_complete());
    }

    #[test]
    fn default_state_flags() {
        let state = WizardState::default();
        assert!(!state.step1_complete());
        assert!(!state.plan_complete());
        assert!(!state.os_selected());
        assert!(state.assign_ipv4);
        assert!(!state.assign_ipv6);
        assert_eq!(state.instance_class, "default");
    }
}
