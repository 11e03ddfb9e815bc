//! Instance listing, detail, and the lifecycle tools around a running
//! instance. Admins see and power-cycle what they are assigned; the
//! rest is owner territory.

use axum::body::Bytes;
use axum::extract::{Form, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::auth::gate;
use crate::models::{Instance, Region, SharedState};
use crate::templates::{
    ChangeOsTemplate, ChangePassTemplate, ConfirmTemplate, CustomForm, InstanceDetailTemplate,
    InstanceRow, InstancesTemplate, OsChoice, PlanChoice, ResizeTemplate,
};
use crate::upstream::instances::{self, InstanceAction};
use crate::upstream::{os, products, regions};
use crate::viewmodel::{format_quantity, PlanCard};
use crate::wizard::codec;

use super::helpers::{flash_redirect, flash_upstream, form_map, globals, render};

const PLACEHOLDER: &str = "—";

fn status_class(status: &str) -> &'static str {
    let status = status.to_ascii_lowercase();
    if status.contains("run") || status == "active" || status == "on" {
        "status-on"
    } else if status.contains("stop") || status.contains("off") {
        "status-off"
    } else {
        "status-other"
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// The API reports an instance's region sometimes by id, sometimes by
/// display name.
fn resolve_region_id(regions: &[Region], raw: &str) -> String {
    regions
        .iter()
        .find(|region| region.id == raw || region.name == raw)
        .map(|region| region.id.clone())
        .unwrap_or_else(|| raw.to_string())
}

async fn hostname_for(state: &SharedState, id: &str) -> String {
    match instances::get(&state.upstream, id).await {
        Ok(instance) => instance.hostname,
        Err(error) => {
            tracing::debug!(%error, instance = %id, "hostname lookup failed");
            id.to_string()
        }
    }
}

// -------------------------------------------------------------- listing

pub async fn list_get(State(state): State<SharedState>, jar: CookieJar) -> Response {
    let user = match gate::require_authenticated(&state, &jar) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let all = match instances::list(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let visible: Vec<Instance> = if user.is_owner() {
        all
    } else {
        let assigned = state
            .store
            .get(&user.username)
            .map(|record| record.assigned_instances)
            .unwrap_or_default();
        all.into_iter()
            .filter(|instance| assigned.contains(&instance.id))
            .collect()
    };
    let rows: Vec<InstanceRow> = visible
        .iter()
        .map(|instance| InstanceRow {
            id: instance.id.clone(),
            hostname: instance.hostname.clone(),
            region: instance.region.clone(),
            status_class: status_class(&instance.status),
            status: instance.status.clone(),
            main_ip: text(&instance.main_ip),
            os_name: text(&instance.os_name),
        })
        .collect();

    let globals = globals(&state, &jar);
    render(InstancesTemplate {
        globals,
        has_instances: !rows.is_empty(),
        instances: rows,
        can_create: user.is_owner(),
    })
}

pub async fn detail_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let user = match gate::require_instance_access(&state, &jar, &id) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let instance = match instances::get(&state.upstream, &id).await {
        Ok(instance) => instance,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            return Redirect::to("/instances").into_response();
        }
    };

    let cpu = instance
        .cpu
        .map(|n| format!("{n} vCPU"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let ram = instance
        .ram_mb
        .map(|mb| format!("{} GB", format_quantity(mb as f64 / 1024.0)))
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let disk = instance
        .disk_gb
        .map(|n| format!("{n} GB"))
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let globals = globals(&state, &jar);
    render(InstanceDetailTemplate {
        globals,
        id: instance.id.clone(),
        hostname: instance.hostname.clone(),
        region: instance.region.clone(),
        status_class: status_class(&instance.status),
        status: instance.status.clone(),
        main_ip: text(&instance.main_ip),
        main_ipv6: text(&instance.main_ipv6),
        cpu,
        ram,
        disk,
        os_name: text(&instance.os_name),
        created_at: text(&instance.created_at),
        owner_tools: user.is_owner(),
    })
}

// -------------------------------------------------------- confirmations

pub async fn confirm_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path((id, action)): Path<(String, String)>,
) -> Response {
    let user = match gate::require_instance_access(&state, &jar, &id) {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let detail_url = format!("/instances/{id}");
    let (title, message, button) = match action.as_str() {
        "poweron" => ("Power on", format!("Power on instance {id}?"), "Power on"),
        "poweroff" => (
            "Power off",
            format!("Power off instance {id}? Running workloads will stop."),
            "Power off",
        ),
        "reset" => (
            "Reset",
            format!("Reset instance {id}? This forces a hard reboot."),
            "Reset",
        ),
        "delete" => (
            "Delete",
            format!("Delete instance {id}? This cannot be undone."),
            "Delete",
        ),
        "refund" => (
            "Request refund",
            format!("Request a refund for instance {id}'s subscription?"),
            "Request refund",
        ),
        _ => {
            return flash_redirect(&state, &jar, "Unknown action.", &detail_url).into_response();
        }
    };
    if matches!(action.as_str(), "delete" | "refund") && !user.is_owner() {
        return flash_redirect(&state, &jar, "Only owners may do that.", &detail_url)
            .into_response();
    }

    let globals = globals(&state, &jar);
    render(ConfirmTemplate {
        globals,
        title: title.to_string(),
        message,
        confirm_url: format!("/instances/{id}/{action}"),
        cancel_url: detail_url,
        button: button.to_string(),
    })
}

// ---------------------------------------------------------------- power

async fn run_power(
    state: SharedState,
    jar: CookieJar,
    id: String,
    action: InstanceAction,
) -> Response {
    if let Err(redirect) = gate::require_instance_access(&state, &jar, &id) {
        return redirect.into_response();
    }
    let detail_url = format!("/instances/{id}");
    match instances::action(&state.upstream, &id, action).await {
        Ok(_) => flash_redirect(
            &state,
            &jar,
            format!("Instance {id} {}.", action.past_tense()),
            &detail_url,
        )
        .into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&detail_url).into_response()
        }
    }
}

pub async fn poweron_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    run_power(state, jar, id, InstanceAction::PowerOn).await
}

pub async fn poweroff_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    run_power(state, jar, id, InstanceAction::PowerOff).await
}

pub async fn reset_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    run_power(state, jar, id, InstanceAction::Reset).await
}

// ---------------------------------------------------------- owner tools

pub async fn delete_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    match instances::delete(&state.upstream, &id).await {
        Ok(_) => {
            // The id is gone upstream; stale allow-list entries would
            // otherwise linger forever.
            if let Err(error) = state.store.remove_instance_everywhere(&id) {
                tracing::warn!(%error, instance = %id, "allow-list scrub failed");
            }
            flash_redirect(
                &state,
                &jar,
                format!("Instance {id} deleted."),
                "/instances",
            )
            .into_response()
        }
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&format!("/instances/{id}")).into_response()
        }
    }
}

pub async fn refund_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let detail_url = format!("/instances/{id}");
    match instances::subscription_refund(&state.upstream, &id).await {
        Ok(_) => flash_redirect(
            &state,
            &jar,
            format!("Refund requested for instance {id}."),
            &detail_url,
        )
        .into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&detail_url).into_response()
        }
    }
}

pub async fn change_pass_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let hostname = hostname_for(&state, &id).await;
    let globals = globals(&state, &jar);
    render(ChangePassTemplate {
        globals,
        instance_id: id,
        hostname,
        new_password: String::new(),
        has_password: false,
    })
}

pub async fn change_pass_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let detail_url = format!("/instances/{id}");
    match instances::change_password(&state.upstream, &id).await {
        Ok(Some(password)) => {
            // Shown exactly once; it is not stored anywhere on our side.
            let hostname = hostname_for(&state, &id).await;
            let globals = globals(&state, &jar);
            render(ChangePassTemplate {
                globals,
                instance_id: id,
                hostname,
                new_password: password,
                has_password: true,
            })
        }
        Ok(None) => flash_redirect(
            &state,
            &jar,
            "Password change requested; the provider did not return the new value.",
            &detail_url,
        )
        .into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&detail_url).into_response()
        }
    }
}

pub async fn change_os_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let hostname = hostname_for(&state, &id).await;
    let images = match os::list(&state.upstream, None, true).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };

    let globals = globals(&state, &jar);
    render(ChangeOsTemplate {
        globals,
        instance_id: id,
        hostname,
        has_images: !images.is_empty(),
        images: OsChoice::list(&images, ""),
    })
}

#[derive(Deserialize)]
pub struct ChangeOsForm {
    pub os_id: String,
}

pub async fn change_os_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<ChangeOsForm>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let detail_url = format!("/instances/{id}");
    let os_id = form.os_id.trim();
    if os_id.is_empty() {
        return flash_redirect(
            &state,
            &jar,
            "Choose an operating system.",
            &format!("/instances/{id}/change-os"),
        )
        .into_response();
    }
    match instances::change_os(&state.upstream, &id, os_id).await {
        Ok(_) => flash_redirect(
            &state,
            &jar,
            format!("Reinstall requested for instance {id}."),
            &detail_url,
        )
        .into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&detail_url).into_response()
        }
    }
}

pub async fn resize_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let instance = match instances::get(&state.upstream, &id).await {
        Ok(instance) => instance,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            return Redirect::to("/instances").into_response();
        }
    };
    let region_list = match regions::list(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let region_id = resolve_region_id(&region_list, &instance.region);
    let offered = match products::list(&state.upstream, &region_id).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let region_map = regions::by_id(&region_list);
    let current = instance.product_id.clone().unwrap_or_default();
    let cards: Vec<PlanChoice> = offered
        .iter()
        .map(|product| {
            PlanChoice::from_card(PlanCard::build(product, &region_map), product.id == current)
        })
        .collect();

    let globals = globals(&state, &jar);
    render(ResizeTemplate {
        globals,
        instance_id: id,
        hostname: instance.hostname,
        has_cards: !cards.is_empty(),
        cards,
        custom: CustomForm::default(),
    })
}

pub async fn resize_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let form = form_map(&body);
    let detail_url = format!("/instances/{id}");
    let resize_url = format!("/instances/{id}/resize");

    let result = if form.first("resize_type").map(str::trim) == Some("custom") {
        let cpu = codec::parse_int(form.first("cpu")).unwrap_or(0);
        let ram_gb = codec::parse_int(form.first("ram_gb")).unwrap_or(0);
        let disk_gb = codec::parse_int(form.first("disk_gb")).unwrap_or(0);
        let bandwidth_tb = codec::parse_int(form.first("bandwidth_tb")).filter(|bw| *bw >= 1);
        if cpu < 1 || ram_gb < 1 || disk_gb < 1 {
            return flash_redirect(
                &state,
                &jar,
                "CPU, RAM, and disk are all required for a custom resize.",
                &resize_url,
            )
            .into_response();
        }
        let instance = match instances::get(&state.upstream, &id).await {
            Ok(instance) => instance,
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                return Redirect::to(&detail_url).into_response();
            }
        };
        let region_list = match regions::list(&state.upstream).await {
            Ok(list) => list,
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                return Redirect::to(&detail_url).into_response();
            }
        };
        let region_id = resolve_region_id(&region_list, &instance.region);
        let mut extra = json!({"cpu": cpu, "ramInGB": ram_gb, "diskInGB": disk_gb});
        if let Some(bw) = bandwidth_tb {
            extra["bandwidthInTB"] = json!(bw);
        }
        instances::resize_to_custom(&state.upstream, &id, &region_id, extra).await
    } else {
        let product_id = form.first("product_id").map(str::trim).unwrap_or("");
        if product_id.is_empty() {
            return flash_redirect(&state, &jar, "Choose a plan to resize to.", &resize_url)
                .into_response();
        }
        instances::resize_to_product(&state.upstream, &id, product_id).await
    };

    match result {
        Ok(_) => flash_redirect(
            &state,
            &jar,
            format!("Resize requested for instance {id}."),
            &detail_url,
        )
        .into_response(),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&detail_url).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_cover_common_states() {
        assert_eq!(status_class("Running"), "status-on");
        assert_eq!(status_class("active"), "status-on");
        assert_eq!(status_class("Stopped"), "status-off");
        assert_eq!(status_class("poweroff"), "status-off");
        assert_eq!(status_class("provisioning"), "status-other");
        assert_eq!(status_class(""), "status-other");
    }

    #[test]
    fn region_resolution_matches_id_or_name() {
        let regions = vec![Region {
            id: "ams1".into(),
            name: "Amsterdam".into(),
            country: None,
            city: None,
            is_active: true,
            is_hidden: false,
            ram_threshold_gb: 1,
            disk_threshold_gb: 1,
        }];
        assert_eq!(resolve_region_id(&regions, "ams1"), "ams1");
        assert_eq!(resolve_region_id(&regions, "Amsterdam"), "ams1");
        assert_eq!(resolve_region_id(&regions, "sgp1"), "sgp1");
    }
}
