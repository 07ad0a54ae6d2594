//! Authorization over the group structure: who belongs where, what each group
//! may run, and which groups administer which.

mod authorizer;
mod graph;
mod ledger;
mod resolver;

pub use authorizer::ManagementAuthorizer;
pub use graph::GroupGraph;
pub use ledger::MembershipLedger;
pub use resolver::{Decision, PermissionResolver, resolve};
