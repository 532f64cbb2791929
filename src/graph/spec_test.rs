use std::sync::Arc;

use super::ConcreteSpec;
use super::DepFlag;

fn leaf(name: &str) -> Arc<ConcreteSpec> {
    Arc::new(ConcreteSpec::new(name, "1.0"))
}

/// # Case 1: routing key is stable for one node
#[test]
fn test_dag_hash_is_memoized_and_stable() {
    let spec = ConcreteSpec::new("zlib", "1.3");
    let first = spec.dag_hash().to_string();
    assert_eq!(spec.dag_hash(), first);
}

/// # Case 2: a different edge set yields a different routing key
#[test]
fn test_dag_hash_depends_on_edges() {
    let mut with_dep = ConcreteSpec::new("zlib", "1.3");
    with_dep.add_dependency_edge(leaf("cmake"), DepFlag::BUILD, vec![]);
    let bare = ConcreteSpec::new("zlib", "1.3");

    assert_ne!(with_dep.dag_hash(), bare.dag_hash());
}

/// # Case 3: edge flags and virtuals are part of the content
#[test]
fn test_dag_hash_depends_on_edge_metadata() {
    let mut build_edge = ConcreteSpec::new("zlib", "1.3");
    build_edge.add_dependency_edge(leaf("gcc"), DepFlag::BUILD, vec![]);
    let mut link_edge = ConcreteSpec::new("zlib", "1.3");
    link_edge.add_dependency_edge(leaf("gcc"), DepFlag::LINK, vec![]);
    let mut with_virtual = ConcreteSpec::new("zlib", "1.3");
    with_virtual.add_dependency_edge(leaf("gcc"), DepFlag::BUILD, vec!["c".to_string()]);

    assert_ne!(build_edge.dag_hash(), link_edge.dag_hash());
    assert_ne!(build_edge.dag_hash(), with_virtual.dag_hash());
}

/// # Case 4: copy_without_deps drops edges and the memoized hash
#[test]
fn test_copy_without_deps() {
    let mut spec = ConcreteSpec::new("zlib", "1.3").with_dev_path("/src/zlib");
    spec.add_dependency_edge(leaf("cmake"), DepFlag::BUILD, vec![]);
    spec.dag_hash();

    let copy = spec.copy_without_deps();
    assert!(copy.edges_to_dependencies().is_empty());
    assert_eq!(copy.name, "zlib");
    assert_eq!(copy.dev_path.as_deref(), Some(std::path::Path::new("/src/zlib")));
    // The copy hashes its own (empty) edge set, not the original's
    assert_ne!(copy.dag_hash(), spec.dag_hash());
}

/// # Case 5: serialization round-trip preserves the resolved shape
#[test]
fn test_spec_json_round_trip() {
    let mut spec = ConcreteSpec::new("hdf5", "1.14");
    spec.add_dependency_edge(leaf("zlib"), DepFlag::BUILD | DepFlag::LINK, vec![]);
    spec.add_dependency_edge(
        leaf("compiler-wrapper"),
        DepFlag::BUILD,
        vec!["c".to_string(), "cxx".to_string()],
    );

    let json = serde_json::to_string(&spec).expect("serialize should succeed");
    let decoded: ConcreteSpec = serde_json::from_str(&json).expect("deserialize should succeed");

    assert_eq!(decoded.name, spec.name);
    assert_eq!(decoded.edges_to_dependencies().len(), 2);
    assert_eq!(
        decoded.edges_to_dependencies()[1].virtuals,
        vec!["c".to_string(), "cxx".to_string()]
    );
    // Identical shape reproduces the identical routing key
    assert_eq!(decoded.dag_hash(), spec.dag_hash());
}
