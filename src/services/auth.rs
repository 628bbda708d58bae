// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User, UserRole, UserStatus},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    admin_emails: Vec<String>,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, admin_emails: Vec<String>, pool: PgPool) -> Self {
        Self { user_repo, jwt_secret, admin_emails, pool }
    }

    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> Result<(String, User), AppError> {
        let hashed_password = hash_password(password).await?;
        let email = normalize_email(email);
        let role = role_for(&self.admin_emails, &email);

        let user = self
            .user_repo
            .create_user(&self.pool, name.trim(), &email, &hashed_password, role)
            .await?;

        tracing::info!("Novo usuário registrado: {}", user.id);
        let token = create_token(&self.jwt_secret, user.id, Utc::now())?;
        Ok((token, user))
    }

    /// Chamado na partida: contas criadas antes de entrarem em ADMIN_EMAILS.
    pub async fn promote_configured_admins(&self) -> Result<(), AppError> {
        if self.admin_emails.is_empty() {
            return Ok(());
        }
        let promoted = self.user_repo.promote_admins(&self.pool, &self.admin_emails).await?;
        if promoted > 0 {
            tracing::info!("{} usuário(s) promovido(s) a administrador", promoted);
        }
        Ok(())
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_email(&self.pool, &normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        ensure_active(&user)?;

        self.user_repo.touch_last_login(&self.pool, user.id).await?;

        let token = create_token(&self.jwt_secret, user.id, Utc::now())?;
        Ok((token, user))
    }

    /// Decodifica o token e carrega o dono. Token válido de um usuário que não
    /// existe mais conta como token inválido.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        let user = self
            .user_repo
            .find_by_id(&self.pool, claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        ensure_active(&user)?;
        Ok(user)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        phone: Option<&str>,
        bio: Option<&str>,
    ) -> Result<User, AppError> {
        self.user_repo
            .update_profile(&self.pool, user_id, name.map(str::trim), phone, bio)
            .await
    }

    pub async fn change_password(&self, user: &User, current: &str, new_password: &str) -> Result<(), AppError> {
        if !verify_password(current, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let hashed_password = hash_password(new_password).await?;
        self.user_repo.update_password(&self.pool, user.id, &hashed_password).await?;

        tracing::info!("Senha alterada para o usuário {}", user.id);
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn role_for(admin_emails: &[String], email: &str) -> UserRole {
    if admin_emails.iter().any(|admin| admin == email) {
        UserRole::Admin
    } else {
        UserRole::User
    }
}

fn ensure_active(user: &User) -> Result<(), AppError> {
    match user.status {
        UserStatus::Active => Ok(()),
        UserStatus::Inactive | UserStatus::Suspended => Err(AppError::AccountInactive),
    }
}

// bcrypt é caro: roda fora das threads do runtime
async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

fn create_token(secret: &str, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
    let expires_at = now + Duration::days(TOKEN_TTL_DAYS);

    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_the_subject() {
        let user_id = Uuid::new_v4();
        let token = create_token("segredo", user_id, Utc::now()).unwrap();

        let claims = decode_token("segredo", &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn rejects_expired_or_foreign_tokens() {
        let user_id = Uuid::new_v4();

        let old = create_token("segredo", user_id, Utc::now() - Duration::days(8)).unwrap();
        assert!(matches!(decode_token("segredo", &old), Err(AppError::InvalidToken)));

        let token = create_token("outro", user_id, Utc::now()).unwrap();
        assert!(matches!(decode_token("segredo", &token), Err(AppError::InvalidToken)));

        assert!(matches!(decode_token("segredo", "lixo"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn emails_are_normalised() {
        assert_eq!(normalize_email("  Ana@Loja.COM "), "ana@loja.com");
    }

    #[test]
    fn listed_emails_register_as_admin() {
        let admins = vec!["dono@loja.com".to_string()];
        assert_eq!(role_for(&admins, &normalize_email(" Dono@Loja.com")), UserRole::Admin);
        assert_eq!(role_for(&admins, "ana@loja.com"), UserRole::User);
        assert_eq!(role_for(&[], "dono@loja.com"), UserRole::User);
    }
}
