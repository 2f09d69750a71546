/*!
 * Approvals Module
 * Approval records and the per-request approval set
 */

mod set;

pub use set::{Approval, ApprovalSet};
