use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::AbstractSpec;
use super::ConcreteSpec;
use crate::SubstitutionError;

/// Whether a substitution inside a persisted environment outlives the
/// trace attempt. An explicit caller choice — the environment never
/// guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePolicy {
    /// Undo the swap after commands are extracted
    Restore,
    /// Leave the instrumented spec in place
    Persist,
}

/// Record of one in-place substitution, sufficient to reverse it.
#[derive(Debug)]
pub struct SpecSwap {
    position: usize,
    user_spec: AbstractSpec,
    original: Arc<ConcreteSpec>,
    replacement_hash: String,
}

impl SpecSwap {
    pub fn user_spec(&self) -> &AbstractSpec {
        &self.user_spec
    }

    pub fn original(&self) -> &Arc<ConcreteSpec> {
        &self.original
    }

    pub fn replacement_hash(&self) -> &str {
        &self.replacement_hash
    }
}

/// A persisted workspace: the ordered user-requested specs, their
/// concretized counterparts in the same order, and the content-hash index
/// that routes trace events back to concretized nodes.
///
/// Mutation is single-writer by contract: substitution runs inside the
/// caller's own transaction around environment persistence.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    user_specs: Vec<AbstractSpec>,
    concretized_user_specs: Vec<AbstractSpec>,
    concretized_order: Vec<String>,
    specs_by_hash: HashMap<String, Arc<ConcreteSpec>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user-requested (abstract) spec. The request text is never
    /// touched by substitution.
    pub fn add_user_spec(
        &mut self,
        request: AbstractSpec,
    ) {
        self.user_specs.push(request);
    }

    pub fn user_specs(&self) -> &[AbstractSpec] {
        &self.user_specs
    }

    /// Associate a concretized spec with its user request, appending to
    /// the ordered concretized lists and the hash index.
    pub fn add_concrete_spec(
        &mut self,
        user_spec: AbstractSpec,
        concrete: Arc<ConcreteSpec>,
    ) {
        let hash = concrete.dag_hash().to_string();
        self.concretized_user_specs.push(user_spec);
        self.concretized_order.push(hash.clone());
        self.specs_by_hash.insert(hash, concrete);
    }

    /// `(user request, concretized spec)` pairs in concretization order
    pub fn concretized_specs(&self) -> Vec<(AbstractSpec, Arc<ConcreteSpec>)> {
        self.concretized_user_specs
            .iter()
            .zip(self.concretized_order.iter())
            .filter_map(|(user, hash)| {
                self.specs_by_hash
                    .get(hash)
                    .map(|spec| (user.clone(), Arc::clone(spec)))
            })
            .collect()
    }

    /// Concretized develop specs (those carrying a `dev_path`)
    pub fn develop_specs(&self) -> Vec<(AbstractSpec, Arc<ConcreteSpec>)> {
        self.concretized_specs()
            .into_iter()
            .filter(|(_, spec)| spec.is_develop())
            .collect()
    }

    pub fn spec_by_hash(
        &self,
        hash: &str,
    ) -> Option<&Arc<ConcreteSpec>> {
        self.specs_by_hash.get(hash)
    }

    /// The routing-key index: content hash -> concretized node
    pub fn specs_by_hash(&self) -> &HashMap<String, Arc<ConcreteSpec>> {
        &self.specs_by_hash
    }

    /// Atomically replace the concretized spec associated with
    /// `user_spec`: remove the old node's hash from the index and its
    /// entry from the ordered list, insert the replacement at the same
    /// ordinal position, and leave the user request untouched. The
    /// resolver is never re-invoked.
    ///
    /// Returns a [`SpecSwap`] that [`Environment::restore`] can reverse.
    pub fn swap_concrete(
        &mut self,
        user_spec: &AbstractSpec,
        replacement: Arc<ConcreteSpec>,
    ) -> std::result::Result<SpecSwap, SubstitutionError> {
        let position = self
            .concretized_user_specs
            .iter()
            .position(|user| user == user_spec)
            .ok_or_else(|| SubstitutionError::SpecNotInEnvironment {
                spec: user_spec.to_string(),
            })?;

        let old_hash = self.concretized_order[position].clone();
        let original = self.specs_by_hash.remove(&old_hash).ok_or_else(|| {
            SubstitutionError::SpecNotInEnvironment {
                spec: user_spec.to_string(),
            }
        })?;

        let replacement_hash = replacement.dag_hash().to_string();
        self.concretized_order[position] = replacement_hash.clone();
        self.specs_by_hash
            .insert(replacement_hash.clone(), replacement);

        debug!(
            "swapped '{}' in environment: {} -> {}",
            user_spec, old_hash, replacement_hash
        );
        Ok(SpecSwap {
            position,
            user_spec: user_spec.clone(),
            original,
            replacement_hash,
        })
    }

    /// Reverse a prior [`Environment::swap_concrete`], putting the
    /// original concretized spec back at its recorded position.
    pub fn restore(
        &mut self,
        swap: SpecSwap,
    ) -> std::result::Result<(), SubstitutionError> {
        match self.concretized_order.get(swap.position) {
            Some(hash) if *hash == swap.replacement_hash => {}
            _ => {
                return Err(SubstitutionError::StaleSwap {
                    spec: swap.user_spec.to_string(),
                })
            }
        }

        self.specs_by_hash.remove(&swap.replacement_hash);
        let original_hash = swap.original.dag_hash().to_string();
        self.concretized_order[swap.position] = original_hash.clone();
        self.specs_by_hash.insert(original_hash, swap.original);
        Ok(())
    }
}
