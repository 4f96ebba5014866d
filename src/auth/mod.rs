//! Token based authentication: issuing and revoking tokens, the auth gate
//! middleware and the register, log in and log out endpoints.

mod cookie;
mod credentials;
mod identity;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod revocation;
mod token;

pub use credentials::{CredentialVerifier, UserLookup, UserStore};
pub use identity::Identity;
pub use log_in::{AuthResponse, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{AuthState, PublicPaths, auth_gate};
pub use register::post_register;
pub use revocation::RevocationRegistry;
pub use token::TokenAuthority;

#[cfg(test)]
pub use cookie::SESSION_COOKIE;
