// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::SchoolStore,
    models::auth::{Actor, ActorKind, Claims},
};

/// Bootstrap administrator configured through the environment.
#[derive(Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password_hash: String,
}

pub const ADMIN_ACTOR_ID: &str = "admin";

#[derive(Clone)]
pub struct AuthService {
    store: SchoolStore,
    admin: Option<AdminAccount>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(store: SchoolStore, admin: Option<AdminAccount>, jwt_secret: String) -> Self {
        Self { store, admin, jwt_secret }
    }

    /// Checks the admin account, then staff school emails, then student emails.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Actor), AppError> {
        let email = email.trim();

        // 1. Administrator
        if let Some(admin) = &self.admin {
            if admin.email.eq_ignore_ascii_case(email) {
                return if verify_password(password, &admin.password_hash).await? {
                    let actor = Actor::admin(ADMIN_ACTOR_ID, "Administrator");
                    Ok((self.create_token(&actor.id, ActorKind::Admin)?, actor))
                } else {
                    Err(AppError::InvalidCredentials)
                };
            }
        }

        // 2. Staff
        let staff = self.store.staff.items().await?;
        if let Some(member) = staff.iter().find(|m| m.school_email.eq_ignore_ascii_case(email)) {
            if !member.is_active || !verify_password(password, &member.password_hash).await? {
                return Err(AppError::InvalidCredentials);
            }
            let actor = Actor::from_staff(member);
            return Ok((self.create_token(&actor.id, ActorKind::Staff)?, actor));
        }

        // 3. Students
        let students = self.store.students.items().await?;
        let student = students
            .iter()
            .find(|s| {
                s.email.eq_ignore_ascii_case(email)
                    || s.school_email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .ok_or(AppError::InvalidCredentials)?;

        if !student.is_active || !verify_password(password, &student.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        let actor = Actor::from_student(student);
        Ok((self.create_token(&actor.id, ActorKind::Student)?, actor))
    }

    /// Decodes the token and rebuilds the actor from the current collections.
    pub async fn validate_token(&self, token: &str) -> Result<Actor, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.resolve_actor(&token_data.claims).await
    }

    pub async fn resolve_actor(&self, claims: &Claims) -> Result<Actor, AppError> {
        match claims.kind {
            ActorKind::Admin if self.admin.is_some() && claims.sub == ADMIN_ACTOR_ID => {
                Ok(Actor::admin(ADMIN_ACTOR_ID, "Administrator"))
            }
            ActorKind::Admin => Err(AppError::InvalidToken),
            ActorKind::Staff => self
                .store
                .staff
                .find(&claims.sub)
                .await?
                .filter(|m| m.is_active)
                .map(|m| Actor::from_staff(&m))
                .ok_or(AppError::InvalidToken),
            ActorKind::Student => self
                .store
                .students
                .find(&claims.sub)
                .await?
                .filter(|s| s.is_active)
                .map(|s| Actor::from_student(&s))
                .ok_or(AppError::InvalidToken),
        }
    }

    pub fn create_token(&self, subject: &str, kind: ActorKind) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

/// Runs bcrypt off the async workers.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    if password_hash.is_empty() {
        return Ok(false);
    }
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(valid)
}
