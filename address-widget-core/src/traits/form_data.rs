//! Form state abstract Trait

use crate::types::FormValues;

/// Current values of the address form
///
/// The workflow reads the form when no explicit address is given and writes back accepted
/// addresses. Implemented by [`crate::views::FormView`].
pub trait FormDataSource: Send + Sync {
    /// Snapshot of all field values
    fn values(&self) -> FormValues;

    /// Merge `updates` into the form; keys not present are left untouched
    fn update_fields(&self, updates: FormValues);
}
