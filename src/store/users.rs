use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::user::User;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE login = ?")
            .bind(login)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(
        &self,
        email: &str,
        login: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, login, password_hash, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, email, login, password_hash, created_at, updated_at",
        )
        .bind(email)
        .bind(login)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }
}
