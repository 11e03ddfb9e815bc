/// An operating-system image offered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OsImage {
    pub id: String,
    pub name: String,
    /// Distribution family ("ubuntu", "windows", ...); empty if the
    /// provider omits it.
    pub family: String,
    pub is_default: bool,
    pub is_active: bool,
    pub min_ram_mb: Option<i64>,
}
