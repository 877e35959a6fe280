//! Cookie session authentication: login, logout, session introspection, and
//! the principal/storage plumbing the profile handlers gate on.

pub(crate) mod login;
pub mod principal;
pub mod session;
mod state;
pub(crate) mod storage;
pub(crate) mod utils;

pub use login::{login, logout};
pub use session::session;
pub use state::AuthConfig;
