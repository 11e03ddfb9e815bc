/// A provisioning region as the console sees it: a typed projection of
/// the upstream record, fetched fresh per request and never cached.
///
/// The custom-plan validator reads the two threshold fields, which the
/// provider nests under the region's `config` object. Regions without a
/// usable config parse with thresholds of 0, so the effective minimum
/// for custom plans is 1 GB.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub is_active: bool,
    pub is_hidden: bool,
    pub ram_threshold_gb: i64,
    pub disk_threshold_gb: i64,
}

impl Region {
    /// Minimum RAM a custom plan may request in this region.
    pub fn min_ram_gb(&self) -> i64 {
        self.ram_threshold_gb.max(1)
    }

    /// Minimum disk a custom plan may request in this region.
    pub fn min_disk_gb(&self) -> i64 {
        self.disk_threshold_gb.max(1)
    }

    /// Selectable in the wizard: flagged active and not hidden.
    pub fn is_selectable(&self) -> bool {
        self.is_active && !self.is_hidden
    }

    /// "City, Country" when both are known, otherwise whichever exists.
    pub fn location(&self) -> String {
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => format!("{city}, {country}"),
            (Some(city), None) => city.to_string(),
            (None, Some(country)) => country.to_string(),
            (None, None) => String::new(),
        }
    }
}
