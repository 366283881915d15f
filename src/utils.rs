use std::{convert::Infallible, error, fmt};

use xitca_web::{
    WebContext,
    error::{Error, MatchError},
    handler::Responder,
    http::{StatusCode, WebResponse},
    service::Service,
};

use crate::error::{ReloadError, ResolveError};

#[derive(Debug)]
pub enum GetError {
    /// No source matched the request metadata and there is no default
    ConfigNotFound,
    /// Credentials do not satisfy the matched source
    Unauthorized { id: String },
    /// Invalid request (e.g. unknown output format)
    BadRequest { reason: String },
    /// A reload was attempted and aborted
    ReloadFailed { reason: String },
    /// Unknown/internal error
    InternalError { reason: String },
}

impl fmt::Display for GetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetError::ConfigNotFound => write!(f, "config not found: no configuration matched metadata"),
            GetError::Unauthorized { id } => {
                write!(f, "unauthorized: authentication failed for config '{id}'")
            }
            GetError::BadRequest { reason } => write!(f, "bad request: {reason}"),
            GetError::ReloadFailed { reason } => write!(f, "reload failed: {reason}"),
            GetError::InternalError { reason } => write!(f, "internal error: {reason}"),
        }
    }
}

impl error::Error for GetError {}

impl GetError {
    pub fn status(&self) -> StatusCode {
        match self {
            GetError::ConfigNotFound => StatusCode::NOT_FOUND,
            GetError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            GetError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            GetError::ReloadFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GetError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ResolveError> for GetError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound => GetError::ConfigNotFound,
            // the detail stays in the logs
            ResolveError::Internal { .. } => GetError::InternalError {
                reason: "configuration index is inconsistent".to_string(),
            },
        }
    }
}

impl From<ReloadError> for GetError {
    fn from(e: ReloadError) -> Self {
        GetError::ReloadFailed {
            reason: e.to_string(),
        }
    }
}

// Error<C> is the main error type xitca-web uses and at some point GetError would
// need to be converted to it.
impl From<GetError> for Error {
    fn from(e: GetError) -> Self {
        Error::from_service(e)
    }
}

// response generator of GetError. Returns appropriate HTTP status codes with error message body.
impl<'r, C> Service<WebContext<'r, C>> for GetError {
    type Response = WebResponse;
    type Error = Infallible;

    async fn call(&self, ctx: WebContext<'r, C>) -> Result<Self::Response, Self::Error> {
        (self.to_string(), self.status())
            .respond(ctx)
            .await
            .map_err(|_| unreachable!())
    }
}

// a middleware function used for intercept and interact with app handler outputs.
pub async fn error_handler<S, C>(s: &S, mut ctx: WebContext<'_, C>) -> Result<WebResponse, Error>
where
    S: for<'r> Service<WebContext<'r, C>, Response = WebResponse, Error = Error>,
{
    match s.call(ctx.reborrow()).await {
        Ok(res) => Ok(res),
        Err(e) => {
            if let Some(get_error) = e.upcast().downcast_ref::<GetError>() {
                match get_error.status() {
                    StatusCode::INTERNAL_SERVER_ERROR => tracing::error!("{get_error}"),
                    _ => tracing::debug!("{get_error}"),
                }
                return Err(e);
            }

            if e.upcast().downcast_ref::<MatchError>().is_some() {
                return ("not found".to_string(), StatusCode::NOT_FOUND)
                    .respond(ctx)
                    .await;
            }

            tracing::error!("{e}");
            Err(e)
        }
    }
}
