//! Axum integration for form requests
//!
//! Two ways to guard a handler:
//!
//! - the [`Validated<F>`] extractor, which runs `F` and hands the validated
//!   data to the handler;
//! - the [`validate::<F>`](validate) middleware, which attaches a
//!   [`ValidatedData`] extension to the request before calling the next
//!   handler.
//!
//! Both reject with the bodies produced by [`BazaarError`].

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, FromRequestParts, Query, RawPathParams, Request},
    http::{Extensions, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::marker::PhantomData;

use super::data::RequestData;
use super::form::FormRequest;
use super::pipeline::ValidationPipeline;
use crate::config::ValidationConfig;
use crate::core::auth::AuthContext;
use crate::core::error::{BazaarError, BazaarResult, RequestError, ValidationError};

/// Largest body the extractor and middleware will buffer
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

impl RequestData {
    /// Collect path params, query string, JSON body and caller identity
    ///
    /// An empty body counts as `{}`.
    pub async fn from_parts(parts: &mut Parts, body: &Bytes) -> BazaarResult<Self> {
        let params = match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
            Err(_) => Map::new(),
        };

        let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| RequestError::InvalidQuery {
                message: e.body_text(),
            })?;
        let query = query
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        let body = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body).map_err(|e| ValidationError::InvalidJson {
                message: e.to_string(),
            })?
        };

        Ok(Self {
            body,
            query,
            params,
            auth: AuthContext::from_extensions(&parts.extensions),
        })
    }
}

/// Pipeline configured by an `Extension<ValidationConfig>` layer, if any
fn pipeline_for(extensions: &Extensions) -> ValidationPipeline {
    let config = extensions
        .get::<ValidationConfig>()
        .copied()
        .unwrap_or_default();
    ValidationPipeline::new(config)
}

async fn buffer(request: Request) -> BazaarResult<(Parts, Bytes, RequestData)> {
    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| RequestError::InvalidBody {
            message: e.to_string(),
        })?;
    let data = RequestData::from_parts(&mut parts, &bytes).await?;
    Ok((parts, bytes, data))
}

/// Axum extractor that authorizes and validates a request with `F`
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn register(
///     Validated(data, _): Validated<RegisterUser>,
/// ) -> BazaarResult<Json<Value>> {
///     // only the declared fields are in `data`
/// }
/// ```
pub struct Validated<F>(pub Value, pub PhantomData<F>);

impl<F> Validated<F> {
    pub fn new(data: Value) -> Self {
        Self(data, PhantomData)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl<F> std::ops::Deref for Validated<F> {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, F> FromRequest<S> for Validated<F>
where
    S: Send + Sync,
    F: FormRequest + Default + 'static,
{
    type Rejection = Response;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, _, data) = buffer(req).await.map_err(IntoResponse::into_response)?;

        pipeline_for(&parts.extensions)
            .run(&F::default(), &data)
            .await
            .map(Validated::new)
            .map_err(IntoResponse::into_response)
    }
}

/// Validated data attached by the [`validate`] middleware
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedData(pub Value);

impl ValidatedData {
    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl<S> FromRequestParts<S> for ValidatedData
where
    S: Send + Sync,
{
    type Rejection = BazaarError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ValidatedData>()
            .cloned()
            .ok_or_else(|| {
                BazaarError::Internal("validate middleware is not installed on this route".into())
            })
    }
}

/// Middleware running `F` before the wrapped handler
///
/// ```rust,ignore
/// Router::new().route(
///     "/users",
///     post(create_user).route_layer(middleware::from_fn(validate::<RegisterUser>)),
/// );
/// ```
///
/// The body is handed on untouched, so the handler may still read it.
pub async fn validate<F>(request: Request, next: Next) -> Response
where
    F: FormRequest + Default + 'static,
{
    let (mut parts, bytes, data) = match buffer(request).await {
        Ok(buffered) => buffered,
        Err(e) => return e.into_response(),
    };

    match pipeline_for(&parts.extensions).run(&F::default(), &data).await {
        Ok(validated) => {
            parts.extensions.insert(ValidatedData(validated));
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(failure) => failure.into_response(),
    }
}
