//! The five provisioning pages. Each GET decodes its state from the
//! query string, each POST from the form body; nothing is kept
//! server-side between steps. Redirect-after-POST everywhere, with the
//! next URL carrying the merged state.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::gate;
use crate::auth::session::push_flash;
use crate::models::SharedState;
use crate::templates::{
    CustomForm, HiddenField, KeyChoice, OsChoice, PlanChoice, RegionChoice, ReviewSummary,
    StartForm, StepLink, WizardKeysTemplate, WizardOsTemplate, WizardPlanTemplate,
    WizardReviewTemplate, WizardStartTemplate,
};
use crate::upstream::{instances, os, products, regions, ssh_keys};
use crate::viewmodel::{self, PlanCard, SpecRow};
use crate::wizard::validate::{self, checked_key_selection};
use crate::wizard::{codec, payload, resume_point, Plan, Step, WizardState};

use super::helpers::{
    flash_field_errors, flash_redirect, flash_upstream, form_map, globals, query_map, render,
};

/// Fields each step's own form edits; everything else rides along as
/// hidden inputs.
const START_FIELDS: &[&str] = &[
    "hostnames",
    "region",
    "instance_class",
    "plan_type",
    "assign_ipv4",
    "assign_ipv6",
    "floating_ip_count",
];
const PLAN_FIELDS: &[&str] = &[
    "plan_type",
    "product_id",
    "extra_disk_gb",
    "extra_bandwidth_tb",
    "cpu",
    "ram_gb",
    "disk_gb",
    "bandwidth_tb",
];
const OS_FIELDS: &[&str] = &["os_id"];
const KEY_FIELDS: &[&str] = &["ssh_key_ids"];

fn step_links(current: Step, state: &WizardState) -> Vec<StepLink> {
    Step::ALL
        .iter()
        .map(|step| StepLink {
            number: step.number(),
            title: step.title(),
            url: codec::step_url(*step, state),
            current: *step == current,
            linked: *step != current && step.can_enter(state),
        })
        .collect()
}

/// Bounce to the first incomplete step when the URL state does not
/// justify being here.
fn entry_redirect(step: Step, state: &WizardState) -> Option<Redirect> {
    if step.can_enter(state) {
        None
    } else {
        let back = resume_point(state);
        Some(Redirect::to(&codec::step_url(back, state)))
    }
}

fn hidden_fields(state: &WizardState, exclude: &[&str]) -> Vec<HiddenField> {
    HiddenField::from_pairs(codec::hidden_pairs(state, exclude))
}

/// Zeroes render as empty inputs, not "0".
fn int_field(value: i64) -> String {
    if value > 0 {
        value.to_string()
    } else {
        String::new()
    }
}

fn custom_form(plan: &Plan) -> CustomForm {
    match plan {
        Plan::Custom {
            cpu,
            ram_gb,
            disk_gb,
            bandwidth_tb,
        } => CustomForm {
            cpu: int_field(*cpu),
            ram_gb: int_field(*ram_gb),
            disk_gb: int_field(*disk_gb),
            bandwidth_tb: bandwidth_tb.map(|bw| bw.to_string()).unwrap_or_default(),
        },
        Plan::Fixed { .. } => CustomForm::default(),
    }
}

fn fixed_extras(plan: &Plan) -> (String, String) {
    match plan {
        Plan::Fixed {
            extra_disk_gb,
            extra_bandwidth_tb,
            ..
        } => (int_field(*extra_disk_gb), int_field(*extra_bandwidth_tb)),
        Plan::Custom { .. } => (String::new(), String::new()),
    }
}

// ---------------------------------------------------------------- start

pub async fn start_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let query = query_map(query);
    let wizard = codec::decode(&query);

    let mut fetch_failed = false;
    let active = match regions::selectable(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            fetch_failed = true;
            Vec::new()
        }
    };
    if active.is_empty() && !fetch_failed {
        push_flash(
            &state,
            &jar,
            "No regions are currently open for provisioning.",
        );
    }

    let selected_region = if wizard.region.is_empty() {
        active.first().map(|r| r.id.clone()).unwrap_or_default()
    } else {
        wizard.region.clone()
    };
    let form = StartForm {
        hostnames_text: wizard.hostnames.join(", "),
        instance_class: wizard.instance_class.clone(),
        plan_type: wizard.plan.type_token().to_string(),
        assign_ipv4: wizard.assign_ipv4,
        assign_ipv6: wizard.assign_ipv6,
        floating_ip_count: wizard.floating_ip_count.to_string(),
    };

    let globals = globals(&state, &jar);
    render(WizardStartTemplate {
        globals,
        steps: step_links(Step::Start, &wizard),
        regions: RegionChoice::list(&active, &selected_region),
        has_regions: !active.is_empty(),
        form,
        hidden: hidden_fields(&wizard, START_FIELDS),
    })
}

pub async fn start_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let form = form_map(&body);

    let active = match regions::selectable(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            return Redirect::to(&codec::preserved_url(Step::Start, &form)).into_response();
        }
    };
    match validate::validate_start(&form, &active) {
        Ok(wizard) => Redirect::to(&codec::step_url(Step::Plan, &wizard)).into_response(),
        Err(errors) => {
            flash_field_errors(&state, &jar, &errors);
            Redirect::to(&codec::preserved_url(Step::Start, &form)).into_response()
        }
    }
}

// ----------------------------------------------------------------- plan

pub async fn plan_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let query = query_map(query);
    let wizard = codec::decode(&query);
    if let Some(redirect) = entry_redirect(Step::Plan, &wizard) {
        return redirect.into_response();
    }

    let region_list = match regions::selectable(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let region = regions::find(&region_list, &wizard.region);
    let (region_label, min_ram_gb, min_disk_gb) = match region {
        Some(region) => (region.location(), region.min_ram_gb(), region.min_disk_gb()),
        None => (wizard.region.clone(), 1, 1),
    };

    let offered = match products::list(&state.upstream, &wizard.region).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let region_map = regions::by_id(&region_list);
    let chosen_product = match &wizard.plan {
        Plan::Fixed { product_id, .. } => product_id.clone(),
        Plan::Custom { .. } => String::new(),
    };
    let cards: Vec<PlanChoice> = offered
        .iter()
        .map(|product| {
            let selected = product.id == chosen_product;
            PlanChoice::from_card(PlanCard::build(product, &region_map), selected)
        })
        .collect();

    let (extra_disk_gb, extra_bandwidth_tb) = fixed_extras(&wizard.plan);
    let globals = globals(&state, &jar);
    render(WizardPlanTemplate {
        globals,
        steps: step_links(Step::Plan, &wizard),
        back_url: codec::step_url(Step::Start, &wizard),
        region_label,
        is_custom: wizard.plan.is_custom(),
        has_cards: !cards.is_empty(),
        cards,
        extra_disk_gb,
        extra_bandwidth_tb,
        custom: custom_form(&wizard.plan),
        min_ram_gb,
        min_disk_gb,
        hidden: hidden_fields(&wizard, PLAN_FIELDS),
    })
}

pub async fn plan_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let form = form_map(&body);
    let wizard = codec::decode(&form);
    if let Some(redirect) = entry_redirect(Step::Plan, &wizard) {
        return redirect.into_response();
    }

    let outcome = if wizard.plan.is_custom() {
        let region_list = match regions::selectable(&state.upstream).await {
            Ok(list) => list,
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                return Redirect::to(&codec::preserved_url(Step::Plan, &form)).into_response();
            }
        };
        match regions::find(&region_list, &wizard.region) {
            Some(region) => validate::validate_custom_plan(&form, region),
            None => {
                return flash_redirect(
                    &state,
                    &jar,
                    format!("Region '{}' is no longer available.", wizard.region),
                    &codec::preserved_url(Step::Start, &form),
                )
                .into_response();
            }
        }
    } else {
        let offered = match products::list(&state.upstream, &wizard.region).await {
            Ok(list) => list,
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                return Redirect::to(&codec::preserved_url(Step::Plan, &form)).into_response();
            }
        };
        validate::validate_fixed_plan(&form, &offered)
    };

    match outcome {
        Ok(plan) => {
            let next = WizardState { plan, ..wizard };
            Redirect::to(&codec::step_url(Step::Os, &next)).into_response()
        }
        Err(errors) => {
            flash_field_errors(&state, &jar, &errors);
            Redirect::to(&codec::preserved_url(Step::Plan, &form)).into_response()
        }
    }
}

// ------------------------------------------------------------------- os

/// RAM floor for the OS filter, from the chosen plan. A failed product
/// lookup only loosens the filter; membership is still checked on
/// submission.
async fn os_ram_floor(state: &SharedState, wizard: &WizardState) -> Option<i64> {
    match &wizard.plan {
        Plan::Fixed { .. } => match products::list(&state.upstream, &wizard.region).await {
            Ok(offered) => viewmodel::ram_mb_for_os_filter(&wizard.plan, &offered),
            Err(error) => {
                tracing::debug!(%error, "product lookup for the OS filter failed");
                None
            }
        },
        Plan::Custom { .. } => viewmodel::ram_mb_for_os_filter(&wizard.plan, &[]),
    }
}

pub async fn os_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let query = query_map(query);
    let wizard = codec::decode(&query);
    if let Some(redirect) = entry_redirect(Step::Os, &wizard) {
        return redirect.into_response();
    }

    let min_ram_mb = os_ram_floor(&state, &wizard).await;
    let images = match os::list(&state.upstream, min_ram_mb, true).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    // Preselect the provider default until the operator has chosen.
    let selected = wizard
        .os_id
        .clone()
        .filter(|id| os::find(&images, id).is_some())
        .or_else(|| os::default_choice(&images).map(|image| image.id.clone()))
        .unwrap_or_default();

    let globals = globals(&state, &jar);
    render(WizardOsTemplate {
        globals,
        steps: step_links(Step::Os, &wizard),
        back_url: codec::step_url(Step::Plan, &wizard),
        has_images: !images.is_empty(),
        images: OsChoice::list(&images, &selected),
        hidden: hidden_fields(&wizard, OS_FIELDS),
    })
}

pub async fn os_post(State(state): State<SharedState>, jar: CookieJar, body: Bytes) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let form = form_map(&body);
    let wizard = codec::decode(&form);
    if let Some(redirect) = entry_redirect(Step::Os, &wizard) {
        return redirect.into_response();
    }

    let min_ram_mb = os_ram_floor(&state, &wizard).await;
    let images = match os::list(&state.upstream, min_ram_mb, true).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            return Redirect::to(&codec::preserved_url(Step::Os, &form)).into_response();
        }
    };
    match validate::validate_os_choice(&form, &images) {
        Ok(os_id) => {
            let next = WizardState {
                os_id: Some(os_id),
                ..wizard
            };
            Redirect::to(&codec::step_url(Step::Keys, &next)).into_response()
        }
        Err(errors) => {
            flash_field_errors(&state, &jar, &errors);
            Redirect::to(&codec::preserved_url(Step::Os, &form)).into_response()
        }
    }
}

// ----------------------------------------------------------------- keys

pub async fn keys_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let query = query_map(query);
    let mut wizard = codec::decode(&query);
    if let Some(redirect) = entry_redirect(Step::Keys, &wizard) {
        return redirect.into_response();
    }

    let keys = match ssh_keys::list(&state.upstream).await {
        Ok(catalog) => {
            let (selection, discarded) = checked_key_selection(&wizard.ssh_key_ids, &catalog);
            if discarded {
                push_flash(
                    &state,
                    &jar,
                    "Some selected SSH keys no longer exist; the selection was cleared.",
                );
            }
            wizard.ssh_key_ids = selection;
            catalog
                .iter()
                .map(|key| KeyChoice {
                    id: key.id,
                    name: key.name.clone(),
                    fingerprint: key.fingerprint.clone().unwrap_or_default(),
                    selected: wizard.ssh_key_ids.contains(&key.id),
                })
                .collect()
        }
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };

    let globals = globals(&state, &jar);
    render(WizardKeysTemplate {
        globals,
        steps: step_links(Step::Keys, &wizard),
        back_url: codec::step_url(Step::Os, &wizard),
        has_keys: !keys.is_empty(),
        keys,
        hidden: hidden_fields(&wizard, KEY_FIELDS),
    })
}

pub async fn keys_post(State(state): State<SharedState>, jar: CookieJar, body: Bytes) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let form = form_map(&body);
    let wizard = codec::decode(&form);
    if let Some(redirect) = entry_redirect(Step::Keys, &wizard) {
        return redirect.into_response();
    }

    let catalog = match ssh_keys::list(&state.upstream).await {
        Ok(catalog) => catalog,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            return Redirect::to(&codec::preserved_url(Step::Keys, &form)).into_response();
        }
    };
    let (selection, discarded) = checked_key_selection(&wizard.ssh_key_ids, &catalog);
    if discarded {
        push_flash(
            &state,
            &jar,
            "Some selected SSH keys no longer exist and were dropped.",
        );
    }
    let next = WizardState {
        ssh_key_ids: selection,
        ..wizard
    };
    Redirect::to(&codec::step_url(Step::Review, &next)).into_response()
}

// --------------------------------------------------------------- review

pub async fn review_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let query = query_map(query);
    let wizard = codec::decode(&query);
    if let Some(redirect) = entry_redirect(Step::Review, &wizard) {
        return redirect.into_response();
    }

    // Everything is re-resolved against the live catalogs. A fetch
    // failure degrades the label to the raw id; a confirmed
    // disappearance sends the operator back to the step that owns it.
    let (region_list, regions_known) = match regions::selectable(&state.upstream).await {
        Ok(list) => (list, true),
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            (Vec::new(), false)
        }
    };
    if regions_known && regions::find(&region_list, &wizard.region).is_none() {
        return flash_redirect(
            &state,
            &jar,
            format!("Region '{}' is no longer available.", wizard.region),
            &codec::step_url(Step::Start, &wizard),
        )
        .into_response();
    }
    let region_label = regions::find(&region_list, &wizard.region)
        .map(|region| region.location())
        .unwrap_or_else(|| wizard.region.clone());

    let plan_name;
    let mut rows: Vec<SpecRow>;
    let mut hourly = String::new();
    let mut monthly = String::new();
    match &wizard.plan {
        Plan::Fixed {
            product_id,
            extra_disk_gb,
            extra_bandwidth_tb,
        } => {
            match products::list(&state.upstream, &wizard.region).await {
                Ok(offered) => match products::find(&offered, product_id) {
                    Some(product) => {
                        let region_map = regions::by_id(&region_list);
                        let card = PlanCard::build(product, &region_map);
                        plan_name = card.name;
                        rows = card.rows;
                        hourly = card.hourly_price.unwrap_or_default();
                        monthly = card.monthly_price.unwrap_or_default();
                    }
                    None => {
                        return flash_redirect(
                            &state,
                            &jar,
                            "The selected plan is no longer offered in this region.",
                            &codec::step_url(Step::Plan, &wizard),
                        )
                        .into_response();
                    }
                },
                Err(error) => {
                    flash_upstream(&state, &jar, &error);
                    plan_name = product_id.clone();
                    rows = Vec::new();
                }
            }
            if *extra_disk_gb > 0 {
                rows.push(SpecRow {
                    label: "Extra disk",
                    value: format!("{extra_disk_gb} GB"),
                });
            }
            if *extra_bandwidth_tb > 0 {
                rows.push(SpecRow {
                    label: "Extra bandwidth",
                    value: format!("{extra_bandwidth_tb} TB"),
                });
            }
        }
        Plan::Custom {
            cpu,
            ram_gb,
            disk_gb,
            bandwidth_tb,
        } => {
            plan_name = "Custom resources".to_string();
            rows = viewmodel::custom_plan_rows(*cpu, *ram_gb, *disk_gb, *bandwidth_tb);
        }
    }

    let os_id = wizard.os_id.clone().unwrap_or_default();
    let os_label = match os::list(&state.upstream, None, true).await {
        Ok(images) => match os::find(&images, &os_id) {
            Some(image) => image.name.clone(),
            None => {
                let cleared = WizardState {
                    os_id: None,
                    ..wizard
                };
                return flash_redirect(
                    &state,
                    &jar,
                    "The selected operating system is no longer available.",
                    &codec::step_url(Step::Os, &cleared),
                )
                .into_response();
            }
        },
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            os_id.clone()
        }
    };

    let mut key_names = Vec::new();
    if !wizard.ssh_key_ids.is_empty() {
        match ssh_keys::list(&state.upstream).await {
            Ok(catalog) => {
                let (selection, discarded) = checked_key_selection(&wizard.ssh_key_ids, &catalog);
                if discarded {
                    let cleared = WizardState {
                        ssh_key_ids: selection,
                        ..wizard
                    };
                    return flash_redirect(
                        &state,
                        &jar,
                        "Some selected SSH keys no longer exist; pick again.",
                        &codec::step_url(Step::Keys, &cleared),
                    )
                    .into_response();
                }
                key_names = wizard
                    .ssh_key_ids
                    .iter()
                    .filter_map(|id| ssh_keys::find(&catalog, *id).map(|key| key.name.clone()))
                    .collect();
            }
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                key_names = wizard
                    .ssh_key_ids
                    .iter()
                    .map(|id| format!("key #{id}"))
                    .collect();
            }
        }
    }

    let summary = ReviewSummary {
        hostnames: wizard.hostnames.clone(),
        region: region_label,
        instance_class: wizard.instance_class.clone(),
        plan_name,
        rows,
        hourly,
        monthly,
        os_label,
        has_keys: !key_names.is_empty(),
        key_names,
        assign_ipv4: wizard.assign_ipv4,
        assign_ipv6: wizard.assign_ipv6,
        floating_ip_count: wizard.floating_ip_count,
    };

    let globals = globals(&state, &jar);
    render(WizardReviewTemplate {
        globals,
        steps: step_links(Step::Review, &wizard),
        back_url: codec::step_url(Step::Keys, &wizard),
        summary,
        hidden: hidden_fields(&wizard, &[]),
    })
}

pub async fn review_post(
    State(state): State<SharedState>,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    if let Err(redirect) = gate::require_owner(&state, &jar) {
        return redirect.into_response();
    }
    let form = form_map(&body);
    let mut wizard = codec::decode(&form);
    if let Some(redirect) = entry_redirect(Step::Review, &wizard) {
        return redirect.into_response();
    }

    // Final membership checks right before the one creation call.
    match &wizard.plan {
        Plan::Fixed { product_id, .. } => {
            let offered = match products::list(&state.upstream, &wizard.region).await {
                Ok(list) => list,
                Err(error) => {
                    flash_upstream(&state, &jar, &error);
                    return Redirect::to(&codec::step_url(Step::Review, &wizard)).into_response();
                }
            };
            if products::find(&offered, product_id).is_none() {
                return flash_redirect(
                    &state,
                    &jar,
                    "The selected plan is no longer offered in this region.",
                    &codec::step_url(Step::Plan, &wizard),
                )
                .into_response();
            }
        }
        Plan::Custom { .. } => {
            let region_list = match regions::selectable(&state.upstream).await {
                Ok(list) => list,
                Err(error) => {
                    flash_upstream(&state, &jar, &error);
                    return Redirect::to(&codec::step_url(Step::Review, &wizard)).into_response();
                }
            };
            if regions::find(&region_list, &wizard.region).is_none() {
                return flash_redirect(
                    &state,
                    &jar,
                    format!("Region '{}' is no longer available.", wizard.region),
                    &codec::step_url(Step::Start, &wizard),
                )
                .into_response();
            }
        }
    }
    if !wizard.ssh_key_ids.is_empty() {
        let catalog = match ssh_keys::list(&state.upstream).await {
            Ok(list) => list,
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                return Redirect::to(&codec::step_url(Step::Review, &wizard)).into_response();
            }
        };
        let (selection, discarded) = checked_key_selection(&wizard.ssh_key_ids, &catalog);
        if discarded {
            wizard.ssh_key_ids = selection;
            return flash_redirect(
                &state,
                &jar,
                "Some selected SSH keys no longer exist; review the selection.",
                &codec::step_url(Step::Keys, &wizard),
            )
            .into_response();
        }
    }

    let request = payload::creation_payload(&wizard);
    match instances::create(&state.upstream, request).await {
        Ok(_) => {
            let count = wizard.hostnames.len();
            tracing::info!(count, region = %wizard.region, "provisioning requested");
            flash_redirect(
                &state,
                &jar,
                format!("Provisioning requested for {count} instance(s)."),
                "/instances",
            )
            .into_response()
        }
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Redirect::to(&codec::step_url(Step::Review, &wizard)).into_response()
        }
    }
}
