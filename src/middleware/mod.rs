pub mod auth;
pub mod authorize;

pub use auth::{authenticate, AuthGate};
pub use authorize::{authorize, PolicyTable, RouteAccess};
