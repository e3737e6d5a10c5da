pub mod auth;
pub mod internal;

pub use auth::AuthError;
pub use internal::InternalError;
