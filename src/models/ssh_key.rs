/// A public SSH key registered with the provider. Ids are numeric on
/// the wire (sometimes as strings); the wizard stores them as integers.
#[derive(Debug, Clone, PartialEq)]
pub struct SshKey {
    pub id: i64,
    pub name: String,
    pub fingerprint: Option<String>,
    pub created_at: Option<String>,
}
