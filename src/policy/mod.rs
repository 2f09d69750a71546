/*!
 * Policy Module
 * Rule model, loading, validation, and the hot-reloadable rule table
 */

pub mod loader;
pub mod rule;
pub mod store;
pub mod table;
pub mod validator;

pub use loader::{load_policy, LoadOptions, LoadedPolicy, PolicyLoader, RECOGNIZED_FIELDS};
pub use rule::{Rule, RuleRecord, DEFAULT_NUM_APPROVERS};
pub use store::{PolicySnapshot, PolicyStore};
pub use table::{RuleLookup, RuleTable};
pub use validator::PolicyValidator;
