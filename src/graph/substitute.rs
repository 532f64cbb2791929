use std::sync::Arc;

use tracing::debug;

use super::ConcreteSpec;
use crate::constants::COMPILER_WRAPPER_NAME;
use crate::SubstitutionError;

/// Replace the compiler-wrapper dependency of an already concretized spec
/// with `replacement`, preserving every other edge exactly — flags and
/// virtuals included — and without re-invoking the resolver.
///
/// Precondition: the original has exactly one edge whose target satisfies
/// the compiler-wrapper role. Zero or several such edges is a hard
/// precondition failure; this never picks one silently.
///
/// Postcondition: the returned spec's routing key differs from the
/// original's (its edge set changed), so callers must index the new node
/// for event routing, not the old one.
pub fn substitute_wrapper(
    original: &ConcreteSpec,
    replacement: &Arc<ConcreteSpec>,
) -> std::result::Result<ConcreteSpec, SubstitutionError> {
    let wrapper_edges = original
        .edges_to_dependencies()
        .iter()
        .filter(|edge| edge.target.name == COMPILER_WRAPPER_NAME)
        .count();
    match wrapper_edges {
        1 => {}
        0 => {
            return Err(SubstitutionError::MissingWrapperEdge {
                spec: original.name.clone(),
            })
        }
        count => {
            return Err(SubstitutionError::AmbiguousWrapperEdge {
                spec: original.name.clone(),
                count,
            })
        }
    }

    let mut wrapped = original.copy_without_deps();
    for edge in original.edges_to_dependencies() {
        if edge.target.name == COMPILER_WRAPPER_NAME {
            wrapped.add_dependency_edge(
                Arc::clone(replacement),
                edge.depflag,
                edge.virtuals.clone(),
            );
        } else {
            wrapped.add_dependency_edge(
                Arc::clone(&edge.target),
                edge.depflag,
                edge.virtuals.clone(),
            );
        }
    }
    debug!(
        "substituted wrapper for '{}': {} -> {}",
        wrapped.name,
        original.dag_hash(),
        wrapped.dag_hash()
    );
    Ok(wrapped)
}
