/// JWT authentication middleware for Bearer token validation.
/// Validates the Authorization header and adds an `AuthUser` to request extensions.
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::jwt;

/// Authenticated caller extracted from the JWT claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
    pub tier_code: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == crate::models::ROLE_ADMIN
    }

    /// Handler-level role check for routes where a path pattern mixes
    /// public and privileged methods.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin access required".to_string()))
        }
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing Authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Authentication("Invalid Authorization scheme, expected Bearer".to_string())
    })?;

    let token_data = jwt::validate_token(token).map_err(|e| {
        tracing::debug!("token validation failed: {}", e);
        AppError::Authentication("Invalid or expired token".to_string())
    })?;

    let id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

    Ok(AuthUser {
        id,
        role: token_data.claims.role,
        tier_code: token_data.claims.tier_code,
    })
}

/// JWT authentication middleware factory
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let user = match authenticate(req.request()) {
                Ok(user) => user,
                Err(e) => return Err(e.into()),
            };

            req.extensions_mut().insert(user);

            let res = service.call(req).await?;
            Ok(res)
        })
    }
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Populated by the middleware on wrapped scopes; routes outside an
        // auth scope fall back to validating the header directly.
        if let Some(user) = req.extensions().get::<AuthUser>().cloned() {
            return ready(Ok(user));
        }

        ready(authenticate(req).map_err(Error::from))
    }
}

/// Optional-auth extractor for public routes that personalize when a valid
/// token is present (e.g. `is_following` on artist pages).
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequest for MaybeAuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthUser>().cloned() {
            return ready(Ok(MaybeAuthUser(Some(user))));
        }

        ready(Ok(MaybeAuthUser(authenticate(req).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_check() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: "admin".to_string(),
            tier_code: "free".to_string(),
        };
        assert!(admin.require_admin().is_ok());

        let user = AuthUser {
            id: Uuid::new_v4(),
            role: "user".to_string(),
            tier_code: "free".to_string(),
        };
        assert!(matches!(
            user.require_admin(),
            Err(AppError::Authorization(_))
        ));
    }
}
