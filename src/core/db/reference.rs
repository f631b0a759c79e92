use std::future::Future;

use crate::models::{ReferenceSpec, ReferenceTable};

/// Physical sizes of the reference objects customers may photograph
pub trait ReferenceSpecRepository {
    fn get_reference_table(&self) -> impl Future<Output = anyhow::Result<ReferenceTable>>;
    fn set_reference_spec(&self, spec: &ReferenceSpec) -> impl Future<Output = anyhow::Result<()>>;
}
