//! Employer posting lifecycle: submission into `review`, the owner's
//! list/detail/delete surface, and the operator review transition that
//! materializes public job listings.

pub mod handlers;
pub mod review;
