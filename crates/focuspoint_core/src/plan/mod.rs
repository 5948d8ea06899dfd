//! crates/focuspoint_core/src/plan/mod.rs
//!
//! AI day plans: fingerprinting, prompting, tolerant parsing and the per-date cache.

pub mod cache;
pub mod fingerprint;
pub mod parser;
pub mod prompt;

pub use cache::{PlanCache, PlanSource};
pub use fingerprint::fingerprint;
pub use parser::{parse_plan_response, ParsedPlan};
pub use prompt::build_plan_prompt;
