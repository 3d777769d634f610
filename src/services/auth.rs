use crate::error::AppError;
use crate::models::user::{AuthResponse, Registration, UserView};
use crate::password::PasswordHasher;
use crate::store::users::UserStore;
use crate::token::TokenIssuer;

#[derive(Clone)]
pub struct AuthService {
    users: UserStore,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(users: UserStore, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Creates the account and returns it with a fresh token. Email is
    /// checked before login, so when both collide the email conflict wins.
    pub async fn register(&self, input: Registration) -> Result<AuthResponse, AppError> {
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(
                "user with this email already exists".to_string(),
            ));
        }
        if self.users.find_by_login(&input.login).await?.is_some() {
            return Err(AppError::Conflict(
                "user with this login already exists".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let user: UserView = self
            .users
            .insert(&input.email, &input.login, &password_hash)
            .await?
            .into();
        let access_token = self.tokens.issue(&user)?;

        Ok(AuthResponse { access_token, user })
    }

    /// Looks the account up by email and verifies the password. Unknown
    /// email and wrong password both come back as `None`.
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserView>, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };
        if self.hasher.verify(password, &user.password_hash) {
            Ok(Some(user.into()))
        } else {
            Ok(None)
        }
    }

    pub fn login(&self, user: UserView) -> Result<AuthResponse, AppError> {
        let access_token = self.tokens.issue(&user)?;
        Ok(AuthResponse { access_token, user })
    }

    /// The account behind a still-valid token may have been removed; that
    /// reads as an invalid token, not a missing resource.
    pub async fn profile(&self, user_id: i64) -> Result<UserView, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;
        Ok(user.into())
    }
}
