//! Service and composition descriptors for the Flow composition compiler.
//!
//! Value objects describing the services a composition is built from —
//! identity, placement, replication, partitioning, consistency — plus the
//! SLA metric sets that frame what the generated dataflow must honour, and
//! the extraction of embedded spec files onto disk.
//!
//! Everything here is built by the frontend and consumed read-only by code
//! generation and deployment; the lowering pass itself never touches these
//! types. Descriptors are plain values: there is no global registry, and
//! callers hand them to whichever phase needs them.

mod descriptor;
mod extract;
mod sla;

pub use descriptor::{
    ConsistencyLevel, PartitionKind, PrimitiveService, Service, ServiceProperties, ServiceSpec,
};
pub use extract::{extract_spec, extract_spec_into, EmbeddedBundle, ExtractError, ResourceBundle};
pub use sla::{Sla, SlaMetric, WorkflowConsistency};
