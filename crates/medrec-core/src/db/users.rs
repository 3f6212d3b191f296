//! User (credential store) database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::User;

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, password_hash, role, is_active, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password_hash: row.get(4)?,
        role: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a new user, returning its id. The `id` field is ignored.
    pub fn insert_user(&self, user: &User) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO users (
                email, first_name, last_name, password_hash, role, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                user.email,
                user.first_name,
                user.last_name,
                user.password_hash,
                user.role,
                user.is_active,
                user.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a user by id.
    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                [id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a user by email (case-insensitive).
    pub fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"),
                [email],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all users ordered by id.
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Activate or deactivate a user.
    pub fn set_user_active(&self, id: i64, is_active: bool) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET is_active = ?2 WHERE id = ?1",
            params![id, is_active],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::insert_test_user;
    use super::*;
    use crate::models::Role;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let user = insert_test_user(&db, "doc@example.org", Role::Doctor);

        let by_id = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(by_id.email, "doc@example.org");
        assert_eq!(by_id.role, Role::Doctor);
        assert!(by_id.is_active);

        let by_email = db.get_user_by_email("DOC@example.org").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[test]
    fn test_missing_user() {
        let db = setup_db();
        assert!(db.get_user(42).unwrap().is_none());
        assert!(db.get_user_by_email("nobody@example.org").unwrap().is_none());
    }

    #[test]
    fn test_set_active() {
        let db = setup_db();
        let user = insert_test_user(&db, "p@example.org", Role::Patient);

        assert!(db.set_user_active(user.id, false).unwrap());
        assert!(!db.get_user(user.id).unwrap().unwrap().is_active);
        assert!(!db.set_user_active(999, false).unwrap());
    }

    #[test]
    fn test_role_is_immutable() {
        let db = setup_db();
        let user = insert_test_user(&db, "p@example.org", Role::Patient);

        let result = db.conn().execute(
            "UPDATE users SET role = 'ADMIN' WHERE id = ?",
            [user.id],
        );
        assert!(result.is_err());
        assert_eq!(db.get_user(user.id).unwrap().unwrap().role, Role::Patient);
    }

    #[test]
    fn test_list_users() {
        let db = setup_db();
        insert_test_user(&db, "a@example.org", Role::Patient);
        insert_test_user(&db, "b@example.org", Role::Pharmacist);

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "a@example.org");
        assert_eq!(users[1].role, Role::Pharmacist);
    }
}
