//! Authentication strategies for SSH connections.
//!
//! Each configured [`Credential`](crate::ssh::Credential) becomes one
//! [`AuthStrategy`]; an [`AuthChain`] tries them in order until the server
//! accepts one.
//!
//! - [`PasswordAuth`]: Password-based authentication
//! - [`KeyAuth`]: Private key authentication (file or inline key)

mod chain;
mod key;
mod password;
mod traits;

pub use chain::AuthChain;
pub use key::KeyAuth;
pub use password::PasswordAuth;
pub use traits::AuthStrategy;
