use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::{
    error::{AppError, AppResult},
    models::{User, UserRole},
    store::{NewUser, Store},
};

/// Hash a raw credential into an Argon2id PHC string with a fresh random salt.
///
/// This is the only hashing scheme in the crate; registration, login and the
/// seed binary all go through it.
pub fn hash_credential(raw: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Check a raw credential against a stored PHC string. A stored value that
/// does not parse never verifies.
pub fn verify_credential(raw: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("stored credential hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone)]
pub struct UserStore {
    store: Store,
}

impl UserStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a customer account. Fails with [`AppError::DuplicateEmail`] when
    /// the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        raw_credential: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<i64> {
        let user = self
            .register_with_role(email, raw_credential, first_name, last_name, UserRole::Customer)
            .await?;
        Ok(user.id)
    }

    pub async fn register_with_role(
        &self,
        email: &str,
        raw_credential: &str,
        first_name: &str,
        last_name: &str,
        role: UserRole,
    ) -> AppResult<User> {
        let email = email.trim();
        let fields = [
            ("email", email),
            ("password", raw_credential),
            ("first_name", first_name.trim()),
            ("last_name", last_name.trim()),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| value.is_empty()) {
            return Err(AppError::validation(format!("{field} is required")));
        }

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        // The UNIQUE constraint still catches a racing registration.
        let user = self
            .store
            .insert_user(NewUser {
                email: email.to_owned(),
                password_hash: hash_credential(raw_credential)?,
                first_name: first_name.trim().to_owned(),
                last_name: last_name.trim().to_owned(),
                role,
            })
            .await?;

        tracing::info!(user_id = user.id, role = ?user.role, "user registered");
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.store
            .find_user_by_email(email.trim())
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }

    /// Unknown email and wrong credential both fail with the same
    /// [`AppError::Auth`].
    pub async fn authenticate(&self, email: &str, raw_credential: &str) -> AppResult<User> {
        let Some(user) = self.store.find_user_by_email(email.trim()).await? else {
            tracing::warn!("login attempt for unknown email");
            return Err(AppError::Auth);
        };

        if !verify_credential(raw_credential, &user.password_hash) {
            tracing::warn!(user_id = user.id, "login attempt with wrong credential");
            return Err(AppError::Auth);
        }

        Ok(user)
    }

    pub fn is_admin(&self, user: &User) -> bool {
        user.is_admin()
    }
}
