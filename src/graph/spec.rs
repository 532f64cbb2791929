use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::OnceLock;

use bitflags::bitflags;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// An abstract, user-requested spec: just the request text, before any
/// resolution. Substitution never touches these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbstractSpec(pub String);

impl AbstractSpec {
    pub fn new(request: impl Into<String>) -> Self {
        AbstractSpec(request.into())
    }
}

impl fmt::Display for AbstractSpec {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Capability flags carried on a dependency edge. Preserved exactly
    /// when the edge's target is substituted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DepFlag: u8 {
        const BUILD = 0b0001;
        const LINK  = 0b0010;
        const RUN   = 0b0100;
        const TEST  = 0b1000;
    }
}

/// One edge of a concretized spec: target node, capability flags, and the
/// virtual-capability names the target satisfies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub target: Arc<ConcreteSpec>,
    pub depflag: DepFlag,
    pub virtuals: Vec<String>,
}

/// A resolved (concretized) unit in the dependency graph, identified by a
/// content hash over its resolved shape — the routing key that maps trace
/// events back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcreteSpec {
    pub name: String,
    pub version: String,
    /// Set on develop specs: the in-tree source checkout the records for
    /// this spec are written next to
    #[serde(default)]
    pub dev_path: Option<PathBuf>,
    #[serde(default)]
    edges: Vec<DependencyEdge>,
    /// Memoized routing key; a copy with a different edge set must start
    /// from an empty cache
    #[serde(skip)]
    dag_hash: OnceLock<String>,
}

impl ConcreteSpec {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ConcreteSpec {
            name: name.into(),
            version: version.into(),
            dev_path: None,
            edges: Vec::new(),
            dag_hash: OnceLock::new(),
        }
    }

    pub fn with_dev_path(
        mut self,
        dev_path: impl Into<PathBuf>,
    ) -> Self {
        self.dev_path = Some(dev_path.into());
        self
    }

    /// Append a dependency edge. Edge order is part of the resolved shape.
    pub fn add_dependency_edge(
        &mut self,
        target: Arc<ConcreteSpec>,
        depflag: DepFlag,
        virtuals: Vec<String>,
    ) {
        self.edges.push(DependencyEdge {
            target,
            depflag,
            virtuals,
        });
    }

    pub fn edges_to_dependencies(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn is_develop(&self) -> bool {
        self.dev_path.is_some()
    }

    /// Content hash over the resolved shape: name, version, and every edge
    /// (flags, virtuals, target hash). Computed once per node; two specs
    /// whose edge sets differ hash differently, which is what keeps
    /// substituted nodes from colliding with their originals.
    pub fn dag_hash(&self) -> &str {
        self.dag_hash.get_or_init(|| {
            let mut hasher = Sha256::new();
            hasher.update(self.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(self.version.as_bytes());
            hasher.update([0u8]);
            for edge in &self.edges {
                hasher.update(edge.depflag.bits().to_le_bytes());
                for virt in &edge.virtuals {
                    hasher.update(virt.as_bytes());
                    hasher.update([0u8]);
                }
                hasher.update(edge.target.dag_hash().as_bytes());
                hasher.update([0u8]);
            }
            format!("{:x}", hasher.finalize())
        })
    }

    /// Shallow copy of the resolved shape without its dependency edges.
    /// The memoized hash is not carried over: the copy's edge set will
    /// change its content.
    pub fn copy_without_deps(&self) -> ConcreteSpec {
        ConcreteSpec {
            name: self.name.clone(),
            version: self.version.clone(),
            dev_path: self.dev_path.clone(),
            edges: Vec::new(),
            dag_hash: OnceLock::new(),
        }
    }
}
