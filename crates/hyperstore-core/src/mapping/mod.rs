//! Tabular-to-record mapping engine
//!
//! A [`MappingDescriptor`] from a data manifest is compiled against the header
//! of its file into a [`MappingPlan`]; a [`RecordStream`] then turns each row
//! into zero or more candidate [`Record`]s.

mod descriptor;
mod expr;
mod plan;
mod resolver;
mod stream;

pub use descriptor::{
    DefaultDescriptor, MappingDescriptor, MemberDescriptor, SwitchDescriptor, UnpackDescriptor,
    WhenDescriptor,
};
pub use expr::Cast;
pub use plan::{MappingPlan, Record, Target};
pub use resolver::{EdgeRef, HyperedgeRef, NodeRef, Resolved, Resolver, TypeCatalog};
pub use stream::RecordStream;
