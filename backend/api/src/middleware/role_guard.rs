/// Scope-level role enforcement. Must sit inside `JwtAuthMiddleware` so the
/// `AuthUser` extension is already populated: 401 when it is not, 403 on a
/// role mismatch.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{ROLE_ADMIN, ROLE_ARTIST};

pub struct RequireRole {
    role: &'static str,
}

impl RequireRole {
    pub fn admin() -> Self {
        Self { role: ROLE_ADMIN }
    }

    pub fn artist() -> Self {
        Self { role: ROLE_ARTIST }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireRoleService {
            service: Rc::new(service),
            role: self.role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    role: &'static str,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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
        let role = self.role;

        Box::pin(async move {
            let caller_role = req.extensions().get::<AuthUser>().map(|u| u.role.clone());

            match caller_role {
                None => Err(AppError::Authentication(
                    "Authentication required".to_string(),
                )
                .into()),
                Some(r) if r != role => Err(AppError::Authorization(format!(
                    "{} access required",
                    capitalize(role)
                ))
                .into()),
                Some(_) => {
                    let res = service.call(req).await?;
                    Ok(res)
                }
            }
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_role_names() {
        assert_eq!(capitalize("admin"), "Admin");
        assert_eq!(capitalize("artist"), "Artist");
        assert_eq!(capitalize(""), "");
    }
}
