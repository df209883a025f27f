pub mod attempts;
pub mod directory;
pub mod jwt;
pub mod login;
pub mod password;
pub mod rate_limit;

pub use attempts::AttemptLedger;
pub use directory::{IdentityDirectory, InMemoryDirectory};
pub use jwt::TokenService;
pub use login::LoginFlow;
pub use password::{hash_password, verify_password};
pub use rate_limit::RateLimiter;
