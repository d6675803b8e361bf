//! User repository
//!
//! Database operations for users and their profiles.

use async_trait::async_trait;
use ccr_core::traits::Id;
use ccr_models::{Account, NewUser, Profile, ProfileChanges, Role, User};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::UserStore;

const ACCOUNT_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
    u.is_active, u.date_joined, u.last_login,
    p.user_id AS profile_user_id, p.role, p.phone, p.company_name
"#;

/// User joined with its (optional) profile
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub profile_user_id: Option<i64>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let profile = match (row.profile_user_id, row.role) {
            (Some(user_id), Some(role)) => Some(Profile {
                user_id,
                role: role
                    .parse::<Role>()
                    .map_err(|e| RepositoryError::Corrupt(e.to_string()))?,
                phone: row.phone,
                company_name: row.company_name,
            }),
            _ => None,
        };

        Ok(Account {
            user: User {
                id: row.id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                password_hash: row.password_hash,
                is_active: row.is_active,
                date_joined: row.date_joined,
                last_login: row.last_login,
            },
            profile,
        })
    }
}

fn into_accounts(rows: Vec<AccountRow>) -> RepositoryResult<Vec<Account>> {
    rows.into_iter().map(Account::try_from).collect()
}

/// User repository implementation
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_account(&self, id: Id) -> RepositoryResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id WHERE u.id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id WHERE u.username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn username_taken(&self, username: &str) -> RepositoryResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn create_account(&self, new_user: NewUser) -> RepositoryResult<Account> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "A user with that username already exists."))?;

        sqlx::query(
            "INSERT INTO profiles (user_id, role, phone, company_name) VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(new_user.role.as_str())
        .bind(&new_user.phone)
        .bind(&new_user.company_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id, role = %new_user.role, "Account created");

        self.find_account(user_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found::<User>(user_id))
    }

    async fn list_accounts(&self) -> RepositoryResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id ORDER BY u.username ASC",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        into_accounts(rows)
    }

    async fn list_by_role(&self, role: Role) -> RepositoryResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id
            WHERE COALESCE(p.role, 'CLIENT') = $1
            ORDER BY u.username ASC
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_accounts(rows)
    }

    async fn update_profile(&self, user_id: Id, changes: ProfileChanges) -> RepositoryResult<Account> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (user_id, role, phone, company_name)
            SELECT id, $2, $3, $4 FROM users WHERE id = $1
            ON CONFLICT (user_id) DO UPDATE
            SET role = EXCLUDED.role,
                phone = EXCLUDED.phone,
                company_name = EXCLUDED.company_name
            "#,
        )
        .bind(user_id)
        .bind(changes.role.as_str())
        .bind(&changes.phone)
        .bind(&changes.company_name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found::<User>(user_id));
        }

        self.find_account(user_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found::<User>(user_id))
    }

    async fn record_login(&self, user_id: Id) -> RepositoryResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_user(&self, user_id: Id) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found::<User>(user_id));
        }

        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: Option<&str>) -> AccountRow {
        AccountRow {
            id: 3,
            username: "obrero1".into(),
            email: "obrero1@example.com".into(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: "hash".into(),
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
            profile_user_id: role.map(|_| 3),
            role: role.map(str::to_string),
            phone: None,
            company_name: None,
        }
    }

    #[test]
    fn test_row_without_profile_is_client() {
        let account = Account::try_from(row(None)).unwrap();
        assert!(account.profile.is_none());
        assert_eq!(account.role(), Role::Client);
    }

    #[test]
    fn test_row_with_profile() {
        let account = Account::try_from(row(Some("WORKER"))).unwrap();
        assert_eq!(account.role(), Role::Worker);
    }

    #[test]
    fn test_unknown_role_is_corrupt() {
        assert!(matches!(
            Account::try_from(row(Some("OWNER"))),
            Err(RepositoryError::Corrupt(_))
        ));
    }
}
