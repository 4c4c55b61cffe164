//! User lifecycle, driven entirely by the external identity provider's
//! webhook events.

pub mod webhook;
