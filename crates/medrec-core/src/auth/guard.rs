//! Role guard: resolves a bearer token to a user and checks the role allow-list.

use tracing::warn;

use super::TokenService;
use crate::db::Database;
use crate::error::{MedRecError, MedRecResult};
use crate::models::{Role, User};

/// Check a resolved user against an allow-list.
pub fn require_role(user: &User, allowed: &[Role]) -> MedRecResult<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        warn!(user_id = user.id, role = %user.role, ?allowed, "role not permitted");
        Err(MedRecError::Forbidden(format!(
            "Operation not permitted for role {}",
            user.role
        )))
    }
}

/// Read-only gate applied before every protected operation.
pub struct RoleGuard<'a> {
    db: &'a Database,
    tokens: &'a TokenService,
}

impl<'a> RoleGuard<'a> {
    pub fn new(db: &'a Database, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    /// Resolve a token to an active user.
    pub fn resolve(&self, token: &str) -> MedRecResult<User> {
        let claims = self.tokens.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            MedRecError::from(e)
        })?;

        let user = self
            .db
            .get_user_by_email(&claims.sub)?
            .ok_or_else(|| {
                warn!(subject = %claims.sub, "token subject does not resolve to a user");
                MedRecError::Unauthenticated("Could not validate credentials".into())
            })?;

        if !user.is_active {
            warn!(user_id = user.id, "token presented for deactivated user");
            return Err(MedRecError::Unauthenticated("Account is deactivated".into()));
        }
        if user.role != claims.role {
            warn!(user_id = user.id, claimed = %claims.role, "token role does not match user");
            return Err(MedRecError::Unauthenticated(
                "Could not validate credentials".into(),
            ));
        }

        Ok(user)
    }

    /// Resolve a token and require the user's role to be in `allowed`.
    pub fn authorize(&self, token: &str, allowed: &[Role]) -> MedRecResult<User> {
        let user = self.resolve(token)?;
        require_role(&user, allowed)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::Claims;
    use crate::db::test_support::insert_test_user;

    fn tokens() -> TokenService {
        TokenService::new(b"guard-test-secret-guard-test-secret", Duration::from_secs(600))
    }

    #[test]
    fn test_allows_listed_role() {
        let db = Database::open_in_memory().unwrap();
        let tokens = tokens();
        let user = insert_test_user(&db, "doc@example.org", Role::Doctor);
        let token = tokens.issue(&user).unwrap().access_token;

        let guard = RoleGuard::new(&db, &tokens);
        let resolved = guard
            .authorize(&token, &[Role::Doctor, Role::Pharmacist])
            .unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[test]
    fn test_rejects_every_set_without_the_role() {
        let db = Database::open_in_memory().unwrap();
        let tokens = tokens();
        let guard = RoleGuard::new(&db, &tokens);

        for (i, role) in Role::ALL.iter().enumerate() {
            let user = insert_test_user(&db, &format!("u{i}@example.org"), *role);
            let token = tokens.issue(&user).unwrap().access_token;

            let others: Vec<Role> = Role::ALL.iter().copied().filter(|r| r != role).collect();
            assert!(matches!(
                guard.authorize(&token, &others),
                Err(MedRecError::Forbidden(_))
            ));
            assert!(matches!(
                guard.authorize(&token, &[]),
                Err(MedRecError::Forbidden(_))
            ));
            assert!(guard.authorize(&token, &[*role]).is_ok());
        }
    }

    #[test]
    fn test_unknown_subject_is_unauthenticated() {
        let db = Database::open_in_memory().unwrap();
        let tokens = tokens();
        let claims = Claims::new("ghost@example.org".into(), Role::Admin, Duration::from_secs(60));
        let token = tokens.sign(&claims).unwrap();

        let result = RoleGuard::new(&db, &tokens).authorize(&token, Role::ALL);
        assert!(matches!(result, Err(MedRecError::Unauthenticated(_))));
    }

    #[test]
    fn test_deactivated_user_is_unauthenticated() {
        let db = Database::open_in_memory().unwrap();
        let tokens = tokens();
        let user = insert_test_user(&db, "p@example.org", Role::Patient);
        let token = tokens.issue(&user).unwrap().access_token;
        db.set_user_active(user.id, false).unwrap();

        let result = RoleGuard::new(&db, &tokens).authorize(&token, &[Role::Patient]);
        assert!(matches!(result, Err(MedRecError::Unauthenticated(_))));
    }

    #[test]
    fn test_role_claim_must_match_record() {
        let db = Database::open_in_memory().unwrap();
        let tokens = tokens();
        let user = insert_test_user(&db, "p@example.org", Role::Patient);
        let claims = Claims::new(user.email.clone(), Role::Admin, Duration::from_secs(60));
        let token = tokens.sign(&claims).unwrap();

        let result = RoleGuard::new(&db, &tokens).authorize(&token, &[Role::Admin]);
        assert!(matches!(result, Err(MedRecError::Unauthenticated(_))));
    }

    #[test]
    fn test_bad_signature_is_unauthenticated() {
        let db = Database::open_in_memory().unwrap();
        let result = RoleGuard::new(&db, &tokens()).authorize("abc.def.ghi", Role::ALL);
        assert!(matches!(result, Err(MedRecError::Unauthenticated(_))));
    }
}
