use crate::context::UserInfo;
use crate::core::ports::tokener::{Payload, Tokener};
use crate::impls::tokener::jwt::JWT;
use actix_web::dev::{Service, ServiceRequest, Transform};
use actix_web::error::ErrorUnauthorized;
use actix_web::{Error, HttpMessage};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub static JWT_SECRET: &str = "JWT_SECRET";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub user: String,
    pub exp: i64,
}

impl Payload for Claim {
    fn user(&self) -> &str {
        &self.user
    }
}

/// Verifies the bearer token issued by the auth provider and stashes the
/// caller's identity for the `UserInfo` extractor. Requests without a valid
/// token never reach the wrapped handlers.
pub struct Jwt {
    secret: Vec<u8>,
}

impl Jwt {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<S> Transform<S, ServiceRequest> for Jwt
where
    S: Service<ServiceRequest> + 'static,
    S::Future: 'static,
    S::Error: Into<Error>,
{
    type Error = Error;
    type Response = S::Response;
    type Transform = JwtService<S>;
    type InitError = ();
    type Future = Pin<Box<dyn Future<Output = Result<Self::Transform, Self::InitError>>>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let secret = self.secret.clone();
        Box::pin(async move {
            Ok(JwtService {
                tokener: JWT::new(secret),
                next_service: service,
            })
        })
    }
}

pub struct JwtService<S> {
    tokener: JWT,
    next_service: S,
}

impl<S> Service<ServiceRequest> for JwtService<S>
where
    S: Service<ServiceRequest>,
    S::Future: 'static,
    S::Error: Into<Error>,
{
    type Response = S::Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.next_service.poll_ready(ctx).map_err(|e| e.into())
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = match req.headers().get("Authorization") {
            Some(header) => header.to_owned(),
            None => return Box::pin(async move { Err(ErrorUnauthorized("no token in header")) }),
        };
        match header.to_str() {
            Err(e) => Box::pin(async move { Err(ErrorUnauthorized(e)) }),
            Ok(value) => {
                let token = value.strip_prefix("Bearer ").unwrap_or(value);
                match <JWT as Tokener<Claim>>::verify_token(&self.tokener, token) {
                    Err(e) => Box::pin(async move { Err(ErrorUnauthorized(e)) }),
                    Ok(claim) => {
                        req.extensions_mut().insert(UserInfo { id: claim.user().to_string() });
                        let res_fut = self.next_service.call(req);
                        Box::pin(async move { res_fut.await.map_err(|e| e.into()) })
                    }
                }
            }
        }
    }
}
