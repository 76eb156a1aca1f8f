//! Service and primitive-service descriptors.
//!
//! Plain value objects built by the frontend and consumed read-only by code
//! generation and deployment tooling. The lowering pass never touches them.
//! There is deliberately no process-global registry: callers pass
//! descriptors by value.

use serde::{Deserialize, Serialize};

/// Read/write ordering guarantee of a primitive service.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    #[default]
    Any,
    Eventual,
    Causal,
    Strong,
}

/// How a service's state space is divided across machines.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PartitionKind {
    #[default]
    None,
    Fixed,
    Dynamic,
}

/// Tri-state deployment properties of a composed service. Unset means
/// "not yet decided by the planner".
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServiceProperties {
    pub is_deployed_already: Option<bool>,
    pub is_primitive: Option<bool>,
    pub is_partitioned: Option<bool>,
    pub is_stateful: Option<bool>,
    pub is_replicated: Option<bool>,
}

/// Where a service's interface specification lives on disk.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Directory the spec files are materialised into. Empty until
    /// extraction runs.
    pub directory: String,
    /// The main spec file name.
    pub main_spec_file: String,
    /// Spec files the main file references, extracted alongside it.
    pub referenced_spec_files: Vec<String>,
}

/// A composed service.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub package_name: String,
    pub url: String,
    pub name: String,
    pub properties: ServiceProperties,
    pub spec: ServiceSpec,
}

impl Service {
    pub fn new(
        package_name: impl Into<String>,
        url: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            url: url.into(),
            name: name.into(),
            properties: ServiceProperties::default(),
            spec: ServiceSpec::default(),
        }
    }
}

/// A primitive (non-composed) service with placement, replication,
/// partitioning, and consistency attributes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveService {
    pub name: String,
    pub full_class_name: String,
    /// Last segment of `full_class_name`.
    pub short_class_name: String,
    pub min_degree: u32,
    pub max_degree: u32,
    pub read_consistency: ConsistencyLevel,
    pub write_consistency: ConsistencyLevel,
    pub partition_key_type: Option<String>,
    pub partition_kind: PartitionKind,
    pub partition_count: u32,
    pub data_source_uri: Option<String>,
    pub configuration_uri: Option<String>,
}

impl PrimitiveService {
    /// Create a descriptor with the documented defaults: consistency `Any`,
    /// partition `None`, partition count 1, replication degree 1.
    pub fn new(name: impl Into<String>, full_class_name: impl Into<String>) -> Self {
        let full_class_name = full_class_name.into();
        let short_class_name = full_class_name
            .rsplit('.')
            .next()
            .unwrap_or(full_class_name.as_str())
            .to_owned();
        Self {
            name: name.into(),
            full_class_name,
            short_class_name,
            min_degree: 1,
            max_degree: 1,
            read_consistency: ConsistencyLevel::default(),
            write_consistency: ConsistencyLevel::default(),
            partition_key_type: None,
            partition_kind: PartitionKind::default(),
            partition_count: 1,
            data_source_uri: None,
            configuration_uri: None,
        }
    }

    // ── Fluent construction ─────────────────────────────────────

    /// Set the replication degree range; consistency stays `Any`.
    pub fn replicate(self, min_degree: u32, max_degree: u32) -> Self {
        self.replicate_with(min_degree, max_degree, ConsistencyLevel::Any, ConsistencyLevel::Any)
    }

    /// Set the replication degree range with explicit consistency levels.
    pub fn replicate_with(
        mut self,
        min_degree: u32,
        max_degree: u32,
        read: ConsistencyLevel,
        write: ConsistencyLevel,
    ) -> Self {
        self.min_degree = min_degree;
        self.max_degree = max_degree;
        self.read_consistency = read;
        self.write_consistency = write;
        self
    }

    /// Partition by `key_type` with kind `Dynamic` and one partition.
    pub fn partition(self, key_type: impl Into<String>) -> Self {
        self.partition_with(key_type, PartitionKind::Dynamic, 1)
    }

    /// Partition by `key_type` with an explicit kind and count.
    pub fn partition_with(
        mut self,
        key_type: impl Into<String>,
        kind: PartitionKind,
        count: u32,
    ) -> Self {
        self.partition_key_type = Some(key_type.into());
        self.partition_kind = kind;
        self.partition_count = count;
        self
    }

    /// Attach the backing data-source URI.
    pub fn data_source(mut self, uri: impl Into<String>) -> Self {
        self.data_source_uri = Some(uri.into());
        self
    }

    /// Attach the configuration URI.
    pub fn configuration(mut self, uri: impl Into<String>) -> Self {
        self.configuration_uri = Some(uri.into());
        self
    }
}
