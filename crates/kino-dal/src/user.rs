use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};

use futures::StreamExt as _;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

use crate::{Error, error::Result};

/// Fixed name of the administrative account ensured by the bootstrap command.
pub const ADMIN_USERNAME: &str = "admin";

pub const ADMIN_ROLE: &str = "admin";

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let res = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid password, error {e}");
    }
    Ok(res.is_ok())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateUser {
    #[garde(length(min = 1, max = 150))]
    pub username: String,
    #[garde(length(min = 8, max = 255))]
    pub password: Option<String>,
    #[garde(inner(inner(length(min = 1, max = 50))))]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserInt {
    id: i64,
    username: String,
    roles: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub roles: Option<Vec<String>>,
}

impl From<UserInt> for User {
    fn from(value: UserInt) -> Self {
        Self {
            id: value.id,
            username: value.username,
            roles: value.roles.map(|s| {
                s.split(",")
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            }),
        }
    }
}

pub type UserRepository = UserRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        payload.validate()?;
        let password = payload.password.map(|p| hash_password(&p)).transpose()?;
        let roles = payload.roles.map(|roles| roles.join(","));
        let result = sqlx::query("INSERT INTO users (username, password, roles) VALUES (?, ?, ?)")
            .bind(&payload.username)
            .bind(&password)
            .bind(&roles)
            .execute(&self.executor)
            .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    /// Idempotent bootstrap: creates the "admin" account with the given
    /// password if it does not exist yet, otherwise leaves it untouched.
    pub async fn ensure_admin(&self, password: &str) -> Result<User> {
        if let Some(user) = self.find_by_username(ADMIN_USERNAME).await? {
            debug!("Administrative account already present");
            return Ok(user);
        }
        self.create(CreateUser {
            username: ADMIN_USERNAME.to_string(),
            password: Some(password.to_string()),
            roles: Some(vec![ADMIN_ROLE.to_string()]),
        })
        .await
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, UserInt>("SELECT id, username, roles FROM users")
            .fetch(&self.executor)
            .take(limit)
            .filter_map(|r| async move { r.ok().map(User::from) })
            .collect::<Vec<_>>()
            .await;
        Ok(users)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("User".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let user: User =
            sqlx::query_as::<_, UserInt>("SELECT id, username, roles FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.executor)
                .await?
                .ok_or_else(|| Error::RecordNotFound("User".to_string()))?
                .into();
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserInt>(
            "SELECT id, username, roles FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.executor)
        .await?
        .map(User::from);
        Ok(user)
    }

    pub async fn check_password(&self, username: &str, password: &str) -> Result<User> {
        let (id, hashed_password): (i64, Option<String>) =
            sqlx::query_as("SELECT id, password FROM users WHERE username = ?")
                .bind(username)
                .fetch_one(&self.executor)
                .await
                .map_err(|e| {
                    debug!("User check error: {e}");
                    Error::InvalidCredentials
                })?;
        if let Some(hashed_password) = hashed_password {
            if verify_password(password, &hashed_password).unwrap_or(false) {
                return self.get(id).await;
            }
        }
        Err(Error::InvalidCredentials)
    }
}
