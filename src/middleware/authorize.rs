// Route authorization: a data-driven policy table evaluated after the
// authentication gate has attached (or withheld) a principal

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::models::{Principal, UserRole};

/// Access requirement for one route pattern.
#[derive(Debug, Clone)]
pub enum RouteAccess {
    Public,
    RequiresRole(UserRole),
    RequiresAnyRole(Vec<UserRole>),
    /// The pattern's `:id` segment must equal the principal's user id,
    /// unless the principal holds the stated role.
    RequiresSelfOrRole(UserRole),
}

#[derive(Debug, Clone)]
struct PolicyRule {
    pattern: String,
    access: RouteAccess,
}

/// Ordered route-access rules; the first matching pattern decides.
///
/// A request matching no rule requires an authenticated principal, so
/// forgetting to list a route never exposes it anonymously.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: &str, access: RouteAccess) -> Self {
        self.rules.push(PolicyRule {
            pattern: pattern.to_string(),
            access,
        });
        self
    }

    /// Decide whether `principal` may reach `path`.
    pub fn evaluate(&self, path: &str, principal: Option<&Principal>) -> Result<(), StatusCode> {
        for rule in &self.rules {
            let Some(captured) = match_pattern(&rule.pattern, path) else {
                continue;
            };

            if matches!(rule.access, RouteAccess::Public) {
                return Ok(());
            }
            let Some(principal) = principal else {
                return Err(StatusCode::UNAUTHORIZED);
            };

            let allowed = match &rule.access {
                RouteAccess::Public => true,
                RouteAccess::RequiresRole(role) => principal.has_role(*role),
                RouteAccess::RequiresAnyRole(roles) => {
                    roles.iter().any(|role| principal.has_role(*role))
                }
                RouteAccess::RequiresSelfOrRole(role) => {
                    principal.has_role(*role)
                        || captured.and_then(|v| v.parse::<i64>().ok()) == Some(principal.user_id)
                }
            };
            return if allowed {
                Ok(())
            } else {
                Err(StatusCode::FORBIDDEN)
            };
        }

        // No explicit rule: authenticated principals only.
        if principal.is_some() {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Match `path` against `pattern`, returning the value bound by the
/// pattern's `:name` segment when it matches. Patterns use path segments:
/// `:name` binds one segment, `*` matches one segment, a trailing `/**`
/// matches any remainder.
fn match_pattern<'a>(pattern: &str, path: &'a str) -> Option<Option<&'a str>> {
    if let Some(prefix) = pattern.strip_suffix("/**") {
        let matched = path == prefix || path.starts_with(&format!("{prefix}/"));
        return matched.then_some(None);
    }

    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut captured = None;
    for (pattern_segment, path_segment) in pattern_segments.iter().zip(&path_segments) {
        if pattern_segment.starts_with(':') {
            captured = Some(*path_segment);
        } else if *pattern_segment != "*" && pattern_segment != path_segment {
            return None;
        }
    }
    Some(captured)
}

/// Authorization stage. Runs strictly after the authentication gate; the
/// principal it consumes is the one the gate attached to this request.
pub async fn authorize(
    State(policies): State<Arc<PolicyTable>>,
    request: Request,
    next: Next,
) -> Response {
    let principal = request.extensions().get::<Principal>();

    match policies.evaluate(request.uri().path(), principal) {
        Ok(()) => next.run(request).await,
        Err(status) => {
            debug!(
                "Denied {} for {} with {}",
                request.uri().path(),
                principal.map(|p| p.username.as_str()).unwrap_or("anonymous"),
                status
            );
            deny(status)
        }
    }
}

fn deny(status: StatusCode) -> Response {
    let message = if status == StatusCode::UNAUTHORIZED {
        "Unauthorized"
    } else {
        "Access denied"
    };
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(user_id: i64, roles: Vec<UserRole>) -> Principal {
        Principal {
            username: "alice".to_string(),
            user_id,
            roles,
        }
    }

    fn table() -> PolicyTable {
        PolicyTable::new()
            .route("/health", RouteAccess::Public)
            .route("/public/**", RouteAccess::Public)
            .route("/api/v1/admin/test", RouteAccess::RequiresRole(UserRole::Admin))
            .route(
                "/api/v1/users/page",
                RouteAccess::RequiresAnyRole(vec![UserRole::Admin, UserRole::Teacher]),
            )
            .route(
                "/api/v1/users/:id/profile",
                RouteAccess::RequiresSelfOrRole(UserRole::Admin),
            )
    }

    #[test]
    fn public_routes_need_no_principal() {
        let table = table();
        assert!(table.evaluate("/health", None).is_ok());
        assert!(table.evaluate("/public/css/site.css", None).is_ok());
    }

    #[test]
    fn role_rule_checks_membership() {
        let table = table();
        let admin = principal(1, vec![UserRole::Admin]);
        let student = principal(2, vec![UserRole::Student]);

        assert!(table.evaluate("/api/v1/admin/test", Some(&admin)).is_ok());
        assert_eq!(
            table.evaluate("/api/v1/admin/test", Some(&student)),
            Err(StatusCode::FORBIDDEN)
        );
        assert_eq!(
            table.evaluate("/api/v1/admin/test", None),
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn any_role_rule_admits_each_listed_role() {
        let table = table();
        let teacher = principal(3, vec![UserRole::Teacher]);
        let student = principal(4, vec![UserRole::Student]);

        assert!(table.evaluate("/api/v1/users/page", Some(&teacher)).is_ok());
        assert_eq!(
            table.evaluate("/api/v1/users/page", Some(&student)),
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn self_or_role_matches_own_id_or_role() {
        let table = table();
        let student = principal(7, vec![UserRole::Student]);
        let admin = principal(1, vec![UserRole::Admin]);

        assert!(table
            .evaluate("/api/v1/users/7/profile", Some(&student))
            .is_ok());
        assert_eq!(
            table.evaluate("/api/v1/users/8/profile", Some(&student)),
            Err(StatusCode::FORBIDDEN)
        );
        assert!(table
            .evaluate("/api/v1/users/8/profile", Some(&admin))
            .is_ok());
    }

    #[test]
    fn unlisted_routes_require_authentication() {
        let table = table();
        let student = principal(2, vec![UserRole::Student]);

        assert_eq!(
            table.evaluate("/api/v1/courses", None),
            Err(StatusCode::UNAUTHORIZED)
        );
        assert!(table.evaluate("/api/v1/courses", Some(&student)).is_ok());
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = PolicyTable::new()
            .route("/api/v1/users/:id", RouteAccess::Public)
            .route("/api/v1/users/:id", RouteAccess::RequiresRole(UserRole::Admin));
        assert!(table.evaluate("/api/v1/users/5", None).is_ok());
    }
}
