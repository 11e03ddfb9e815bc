//! Read-only catalog pages: regions, products per region, OS images.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::gate;
use crate::models::Region;
use crate::models::SharedState;
use crate::templates::{
    OsCatalogTemplate, OsRow, PlanChoice, ProductsTemplate, RegionChoice, RegionRow,
    RegionsTemplate,
};
use crate::upstream::{os, products, regions};
use crate::viewmodel::PlanCard;

use super::helpers::{flash_upstream, globals, render};

fn region_status(region: &Region) -> String {
    if !region.is_active {
        "inactive".to_string()
    } else if region.is_hidden {
        "hidden".to_string()
    } else {
        "active".to_string()
    }
}

pub async fn regions_get(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Err(redirect) = gate::require_authenticated(&state, &jar) {
        return redirect.into_response();
    }
    // The full list, hidden and inactive included; this page is the
    // one place that shows the catalog as the provider sees it.
    let list = match regions::list(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let rows: Vec<RegionRow> = list
        .iter()
        .map(|region| RegionRow {
            id: region.id.clone(),
            name: region.name.clone(),
            location: region.location(),
            status: region_status(region),
            min_ram_gb: region.min_ram_gb(),
            min_disk_gb: region.min_disk_gb(),
        })
        .collect();

    let globals = globals(&state, &jar);
    render(RegionsTemplate {
        globals,
        has_regions: !rows.is_empty(),
        regions: rows,
    })
}

pub async fn products_get(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(redirect) = gate::require_authenticated(&state, &jar) {
        return redirect.into_response();
    }
    let region_list = match regions::selectable(&state.upstream).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let selected = params
        .get("region")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| region_list.first().map(|region| region.id.clone()))
        .unwrap_or_default();

    let cards = if selected.is_empty() {
        Vec::new()
    } else {
        match products::list(&state.upstream, &selected).await {
            Ok(offered) => {
                let region_map = regions::by_id(&region_list);
                offered
                    .iter()
                    .map(|product| {
                        PlanChoice::from_card(PlanCard::build(product, &region_map), false)
                    })
                    .collect()
            }
            Err(error) => {
                flash_upstream(&state, &jar, &error);
                Vec::new()
            }
        }
    };

    let globals = globals(&state, &jar);
    render(ProductsTemplate {
        globals,
        regions: RegionChoice::list(&region_list, &selected),
        has_cards: !cards.is_empty(),
        cards,
    })
}

pub async fn os_get(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Err(redirect) = gate::require_authenticated(&state, &jar) {
        return redirect.into_response();
    }
    // Unfiltered, inactive images included.
    let images = match os::list(&state.upstream, None, false).await {
        Ok(list) => list,
        Err(error) => {
            flash_upstream(&state, &jar, &error);
            Vec::new()
        }
    };
    let rows: Vec<OsRow> = images
        .iter()
        .map(|image| OsRow {
            id: image.id.clone(),
            name: image.name.clone(),
            family: image.family.clone(),
            min_ram: image
                .min_ram_mb
                .map(|mb| format!("{mb} MB"))
                .unwrap_or_else(|| "—".to_string()),
            active: image.is_active,
            is_default: image.is_default,
        })
        .collect();

    let globals = globals(&state, &jar);
    render(OsCatalogTemplate {
        globals,
        has_images: !rows.is_empty(),
        images: rows,
    })
}
