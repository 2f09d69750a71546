/*!
 * Core Module
 * Identifier types, errors, and limits shared by every subsystem
 */

pub mod errors;
pub mod limits;
pub mod types;

pub use errors::{LoadError, LoadResult, PolicyViolation, RequestError, RequestResult};
pub use types::{Label, RequestId, UserId};

/// Parse a boolean-ish environment flag (`1` or `true`)
pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
