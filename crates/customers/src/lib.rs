//! Customer directory domain module.
//!
//! Users are created and refreshed from the profile the messaging front end
//! supplies. The storefront does not authenticate anyone.

pub mod user;

pub use user::{User, UserProfile};
