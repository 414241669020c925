use std::collections::{BTreeSet, HashSet};

/// Lookup of the metadata fields the importer may recover from `<metadata>`
/// elements. A key the host does not recognize aborts the import.
pub trait FieldResolver {
    fn is_known(&self, key: &str) -> bool;
}

impl FieldResolver for BTreeSet<String> {
    fn is_known(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl FieldResolver for HashSet<String> {
    fn is_known(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// Accepts every metadata key. Useful when no field catalog is available and
/// the document is trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFields;

impl FieldResolver for AcceptAllFields {
    fn is_known(&self, _key: &str) -> bool {
        true
    }
}
