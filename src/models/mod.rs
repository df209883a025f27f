pub mod user;

pub use user::{Claims, DirectoryUser, LoginRequest, LoginResponse, Principal, UserRole};
