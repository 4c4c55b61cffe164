//! Candidate application lifecycle: intake against a published listing and
//! the employer's one-way decision transition.

pub mod decision;
pub mod intake;
