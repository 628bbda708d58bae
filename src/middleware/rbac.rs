// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{User, UserRole},
};

/// Perfil exigido por uma rota
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> UserRole;
}

/// Extractor que barra (403) usuários sem o perfil `T`.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        check_role(&user, T::role()).map_err(|app_err| {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_headers(&parts.headers);
            app_err.to_api_error(&locale, &app_state.i18n_store)
        })?;

        Ok(RequireRole(PhantomData))
    }
}

fn check_role(user: &User, required: UserRole) -> Result<(), AppError> {
    if user.role == required {
        Ok(())
    } else {
        tracing::warn!("Usuário {} sem o perfil '{}'", user.id, required.as_str());
        Err(AppError::RoleRequired(required.as_str()))
    }
}

// ---
// PERFIS
// ---

pub struct RoleAdmin;
impl RoleDef for RoleAdmin {
    fn role() -> UserRole {
        UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@loja.com".into(),
            password_hash: String::new(),
            role,
            phone: None,
            bio: None,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_passes_admin_check() {
        assert!(check_role(&user(UserRole::Admin), RoleAdmin::role()).is_ok());
    }

    #[test]
    fn regular_user_is_forbidden() {
        let err = check_role(&user(UserRole::User), RoleAdmin::role()).unwrap_err();
        assert!(matches!(err, AppError::RoleRequired("admin")));
    }
}
