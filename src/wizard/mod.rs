//! The provisioning wizard's state machine.
//!
//! No wizard state survives on the server between requests. Every GET
//! and POST carries the full accumulated state in its query string or
//! form body; [`codec`] rebuilds a typed [`WizardState`] from it,
//! [`steps`] decides what the operator may see next, [`validate`]
//! checks submissions against freshly fetched catalog data, and
//! [`payload`] turns a finished state into the one creation request.

pub mod codec;
pub mod payload;
pub mod state;
pub mod steps;
pub mod validate;

pub use codec::QueryMap;
pub use state::{Plan, WizardState};
pub use steps::{resume_point, Step};
