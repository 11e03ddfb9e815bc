//! Askama template structs, one file per page.
//!
//! Every page struct carries a [`Globals`] for the shared chrome (nav,
//! flash messages) plus pre-shaped rows for its own content. Handlers
//! do all the shaping; templates only loop and print, so Option
//! matching and formatting never leak into the HTML.

mod change_os;
mod change_pass;
mod confirm;
mod instance_detail;
mod instances;
mod login;
mod os_catalog;
mod products;
mod regions;
mod resize;
mod ssh_keys;
mod user_detail;
mod users;
mod wizard_keys;
mod wizard_os;
mod wizard_plan;
mod wizard_review;
mod wizard_start;

pub use change_os::ChangeOsTemplate;
pub use change_pass::ChangePassTemplate;
pub use confirm::ConfirmTemplate;
pub use instance_detail::InstanceDetailTemplate;
pub use instances::{InstanceRow, InstancesTemplate};
pub use login::LoginTemplate;
pub use os_catalog::{OsCatalogTemplate, OsRow};
pub use products::ProductsTemplate;
pub use regions::{RegionRow, RegionsTemplate};
pub use resize::ResizeTemplate;
pub use ssh_keys::{KeyRow, SshKeysTemplate};
pub use user_detail::{AccessRow, UserDetailTemplate};
pub use users::{UserRow, UsersTemplate};
pub use wizard_keys::{KeyChoice, WizardKeysTemplate};
pub use wizard_os::WizardOsTemplate;
pub use wizard_plan::WizardPlanTemplate;
pub use wizard_review::{ReviewSummary, WizardReviewTemplate};
pub use wizard_start::{StartForm, WizardStartTemplate};

use crate::models::{OsImage, Region};
use crate::viewmodel::{PlanCard, SpecRow};

/// Shared chrome data rendered by `base.html` on every page.
#[derive(Default)]
pub struct Globals {
    pub username: String,
    pub logged_in: bool,
    pub is_owner: bool,
    /// Host of the provisioning API, shown next to the brand.
    pub api_host: String,
    pub flash_messages: Vec<String>,
    pub has_flash: bool,
}

/// Carried wizard state rendered as hidden form inputs.
pub struct HiddenField {
    pub name: String,
    pub value: String,
}

impl HiddenField {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Vec<HiddenField> {
        pairs
            .into_iter()
            .map(|(name, value)| HiddenField { name, value })
            .collect()
    }
}

/// One entry in the wizard progress header.
pub struct StepLink {
    pub number: usize,
    pub title: &'static str,
    pub url: String,
    pub current: bool,
    /// Rendered as a link; only steps whose preconditions hold.
    pub linked: bool,
}

/// A `<select>` option for a region.
pub struct RegionChoice {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

impl RegionChoice {
    pub fn list(regions: &[Region], selected: &str) -> Vec<RegionChoice> {
        regions
            .iter()
            .map(|region| RegionChoice {
                id: region.id.clone(),
                label: region.location(),
                selected: region.id == selected,
            })
            .collect()
    }
}

/// A radio option for an operating system image.
pub struct OsChoice {
    pub id: String,
    pub label: String,
    pub family: String,
    pub selected: bool,
}

impl OsChoice {
    pub fn list(images: &[OsImage], selected: &str) -> Vec<OsChoice> {
        images
            .iter()
            .map(|os| OsChoice {
                id: os.id.clone(),
                label: os.name.clone(),
                family: os.family.clone(),
                selected: os.id == selected,
            })
            .collect()
    }
}

/// A selectable product card on the plan, products, and resize pages.
pub struct PlanChoice {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub rows: Vec<SpecRow>,
    /// Pre-formatted price lines; empty string when the catalog record
    /// carries no price entry.
    pub hourly: String,
    pub monthly: String,
    pub high_frequency: bool,
    pub selected: bool,
}

impl PlanChoice {
    pub fn from_card(card: PlanCard, selected: bool) -> PlanChoice {
        PlanChoice {
            id: card.id,
            name: card.name,
            description: card.description,
            location: card.location,
            rows: card.rows,
            hourly: card.hourly_price.unwrap_or_default(),
            monthly: card.monthly_price.unwrap_or_default(),
            high_frequency: card.high_frequency,
            selected,
        }
    }
}

/// Raw input echo for the custom-resource fields.
#[derive(Default)]
pub struct CustomForm {
    pub cpu: String,
    pub ram_gb: String,
    pub disk_gb: String,
    pub bandwidth_tb: String,
}
