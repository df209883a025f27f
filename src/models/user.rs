use serde::{Deserialize, Serialize};

/// Role codes as stored in the identity directory and embedded in tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub fn as_code(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Teacher => "TEACHER",
            UserRole::Student => "STUDENT",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Account record as served by the identity directory. The directory owns
/// persistence; this core only reads it and inspects the two flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<UserRole>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
}

/// Signed token claims: subject, role code, numeric user id, issue and
/// expiry timestamps in unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// The verified identity attached to one request's processing lifetime.
/// Carried as a request extension, never in shared state.
#[derive(Debug, Clone)]
pub struct Principal {
    pub username: String,
    pub user_id: i64,
    pub roles: Vec<UserRole>,
}

impl Principal {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or registered email address.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}
