//! Tower layer running the param converters in front of a handler.
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::patch, Router};
//! use entity_binding_core::ConverterConfiguration;
//! use entity_binding_web::{bound_response, BoundAttributes, ConverterState};
//!
//! let state = ConverterState::new(forms, registry);
//! let app = Router::new().route(
//!     "/items/:id",
//!     patch(|attributes: BoundAttributes| async move { bound_response(&attributes, "item") })
//!         .layer(state.layer(ConverterConfiguration::update("item").with_type("ItemType"))),
//! );
//! ```
//!
//! # Flow
//!
//! 1. **Read** route path parameters as request attributes
//! 2. **Buffer** the body (bounded) and decode a JSON object or a form body;
//!    delete configurations leave the body alone
//! 3. **Apply** the converter manager for the layer's configuration
//! 4. **Store** [`BoundAttributes`] in the request extensions and forward
//!    the request with its original body
//!
//! Converter failures short-circuit into an [`AppError`] response.

use crate::error::AppError;
use crate::extractors::BoundAttributes;
use axum::{
    body::{Body, Bytes},
    extract::{rejection::PathRejection, Path, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use entity_binding_core::config::{ConverterConfiguration, ConverterKind};
use entity_binding_core::converter::ConverterManager;
use entity_binding_core::request::ConverterRequest;
use http_body_util::LengthLimitError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Default maximum size of a buffered request body (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Layer binding requests through one converter configuration.
#[derive(Clone, Debug)]
pub struct ParamConverterLayer {
    converters: ConverterManager,
    configuration: Arc<ConverterConfiguration>,
    body_limit: usize,
}

impl ParamConverterLayer {
    /// Layer applying `converters` with `configuration`.
    #[must_use]
    pub fn new(converters: ConverterManager, configuration: ConverterConfiguration) -> Self {
        Self {
            converters,
            configuration: Arc::new(configuration),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Maximum number of body bytes buffered per request.
    #[must_use]
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl<S> Layer<S> for ParamConverterLayer {
    type Service = ParamConverterMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ParamConverterMiddleware {
            inner,
            converters: self.converters.clone(),
            configuration: Arc::clone(&self.configuration),
            body_limit: self.body_limit,
        }
    }
}

/// Middleware service produced by [`ParamConverterLayer`].
#[derive(Clone, Debug)]
pub struct ParamConverterMiddleware<S> {
    inner: S,
    converters: ConverterManager,
    configuration: Arc<ConverterConfiguration>,
    body_limit: usize,
}

impl<S> Service<Request> for ParamConverterMiddleware<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // The ready service is the one we were polled on
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let converters = self.converters.clone();
        let configuration = Arc::clone(&self.configuration);
        let body_limit = self.body_limit;

        let span = tracing::info_span!(
            "param_converter",
            name = %configuration.name,
            kind = %configuration.kind,
            method = %req.method(),
            uri = %req.uri(),
        );

        Box::pin(
            async move {
                match bind(req, &converters, &configuration, body_limit).await {
                    Ok(req) => inner.call(req).await,
                    Err(err) => Ok(err.into_response()),
                }
            }
            .instrument(span),
        )
    }
}

/// Run the converters and attach their attributes to the request.
async fn bind(
    req: Request,
    converters: &ConverterManager,
    configuration: &ConverterConfiguration,
    body_limit: usize,
) -> Result<Request, AppError> {
    let (mut parts, body) = req.into_parts();

    let params = match parts.extract::<Path<HashMap<String, String>>>().await {
        Ok(Path(params)) => params,
        Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
        Err(rejection) => return Err(AppError::bad_request(rejection.body_text())),
    };

    // Deletion never reads the body; it is forwarded untouched.
    let (data, body) = match configuration.kind {
        ConverterKind::Update => {
            let bytes = read_body(body, body_limit).await?;
            (decode_body(&parts.headers, &bytes)?, Body::from(bytes))
        }
        ConverterKind::Delete => (Map::new(), body),
    };

    tracing::debug!(params = params.len(), fields = data.len(), "Binding request");

    let mut request = params.into_iter().fold(
        ConverterRequest::new(parts.method.clone()).with_body(data),
        |request, (name, value)| request.with_param(name, value),
    );
    converters.apply(&mut request, configuration).await?;

    let mut bound = BoundAttributes(request.into_attributes());
    if let Some(outer) = parts.extensions.remove::<BoundAttributes>() {
        bound.merge(outer.0);
    }
    parts.extensions.insert(bound);

    Ok(Request::from_parts(parts, body))
}

/// Buffer at most `limit` bytes of the body.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, AppError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let message = format!("Unable to read request body: {e}");
        if e.into_inner().is::<LengthLimitError>() {
            AppError::payload_too_large(format!(
                "Request body exceeds the limit of {limit} bytes"
            ))
        } else {
            AppError::bad_request(message)
        }
    })
}

/// Decode a JSON object or form-urlencoded body into submitted data.
fn decode_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Map<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE));

    if is_form {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)
            .map_err(|e| AppError::bad_request(format!("Invalid form body: {e}")))?;
        return Ok(pairs
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(data)) => Ok(data),
        Ok(_) => Err(AppError::bad_request("Request body must be a JSON object")),
        Err(e) => Err(AppError::bad_request(format!("Invalid JSON body: {e}"))),
    }
}
