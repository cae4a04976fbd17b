use uuid::Uuid;

/// Source of identity values for new rows. The table layer never checks
/// uniqueness, so implementations must not repeat themselves.
pub trait IdSource: Send + Sync {
    fn generate(&self, prefix: &str) -> String;
}

/// `PREFIX-<uuid v4 simple>`, e.g. `BANK-9b2f0c...`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn generate(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4().simple())
    }
}
