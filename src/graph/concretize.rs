#[cfg(test)]
use mockall::automock;

use super::AbstractSpec;
use super::ConcreteSpec;
use crate::Result;

/// The external dependency resolver, consumed at its interface boundary.
/// The core never replicates resolution logic; it only takes a finished
/// concrete spec and substitutes afterward.
#[cfg_attr(test, automock)]
pub trait Concretizer: Send + Sync {
    /// Turn one abstract request into a concrete spec
    fn concretize_one(
        &self,
        request: &AbstractSpec,
    ) -> Result<ConcreteSpec>;

    /// Concretize several requests together where possible
    fn concretize_together(
        &self,
        requests: &[AbstractSpec],
    ) -> Result<Vec<ConcreteSpec>>;
}
