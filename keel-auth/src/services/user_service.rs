use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::PgConnection;

use crate::models::{NewUser, User};
use crate::schema::users;

pub fn find_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .first(conn)
        .optional()
}

pub fn find_by_id(conn: &mut PgConnection, id: i32) -> QueryResult<Option<User>> {
    users::table.find(id).first(conn).optional()
}

/// Insert relies on the unique index on `email` for correctness; the caller
/// remaps a unique violation to its domain error instead of pre-checking.
pub fn create_password_user(
    conn: &mut PgConnection,
    email: &str,
    password_hash: &str,
) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(NewUser {
            email: Some(email.to_string()),
            password_hash: Some(password_hash.to_string()),
        })
        .get_result(conn)
}

/// Users arriving through a provider may have no email at all.
pub fn create_oauth_user(conn: &mut PgConnection, email: Option<&str>) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(NewUser {
            email: email.map(str::to_string),
            password_hash: None,
        })
        .get_result(conn)
}

pub fn is_unique_violation(err: &DieselError) -> bool {
    matches!(err, DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
}
