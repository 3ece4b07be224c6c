//! `integrador-data` — typed read/write operations over the remote store.
//!
//! Services compose the query cache, the remote-store boundary, and the
//! session store into the named operations the views consume: profile,
//! organization, user list, and account (sign-in/sign-up) flows. Every
//! write declares the read keys it invalidates.

pub mod account;
#[cfg(test)]
mod integration_tests;
pub mod organization;
pub mod profile;
pub mod remote;
pub mod users;

pub use account::{AccountService, TenantRegistration};
pub use organization::{Organization, OrganizationChanges, OrganizationService};
pub use profile::{Profile, ProfileChanges, ProfileService};
pub use remote::{Filter, RemoteStore};
pub use users::{UserSummary, UsersService};
