use breakwater_service_api::service::{HasServiceErrorSource, ServiceErrorSource};
use fedimint_tonic_lnd::tonic::{Code, Status};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LnClientErrorSourceKind {
    #[error("LND tonic gRPC error: {0}")]
    TonicError(Status),
    #[error("LND connection error: {0}")]
    ConnectError(fedimint_tonic_lnd::ConnectError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("malformed server response: {0}")]
    MalformedResponse(String),
    #[error("unknown channel close update: {0}")]
    UnknownCloseUpdate(String),
    #[error("operation timed out")]
    Timeout,
}

#[derive(Error, Debug)]
pub struct LnClientError {
    context: Cow<'static, str>,
    #[source]
    source: LnClientErrorSourceKind,
    esource: ServiceErrorSource,
}

impl Display for LnClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LnClientError: while {}: {}",
            self.context.as_ref(),
            self.source
        )
    }
}

impl LnClientError {
    pub fn new<C: Into<Cow<'static, str>>>(
        source: LnClientErrorSourceKind,
        esource: ServiceErrorSource,
        context: C,
    ) -> Self {
        Self {
            context: context.into(),
            source,
            esource,
        }
    }

    pub fn from_invalid_request<S: Into<String>, C: Into<Cow<'static, str>>>(
        source: S,
        context: C,
    ) -> Self {
        Self::new(
            LnClientErrorSourceKind::InvalidRequest(source.into()),
            ServiceErrorSource::Downstream,
            context,
        )
    }

    pub fn from_tonic_error<C: Into<Cow<'static, str>>>(source: Status, context: C) -> Self {
        let esource = Self::from_tonic_code(source.code());
        Self::new(LnClientErrorSourceKind::TonicError(source), esource, context)
    }

    pub fn from_connect_error<C: Into<Cow<'static, str>>>(
        source: fedimint_tonic_lnd::ConnectError,
        esource: ServiceErrorSource,
        context: C,
    ) -> Self {
        Self::new(LnClientErrorSourceKind::ConnectError(source), esource, context)
    }

    pub fn from_malformed_response<S: Into<String>, C: Into<Cow<'static, str>>>(
        source: S,
        context: C,
    ) -> Self {
        Self::new(
            LnClientErrorSourceKind::MalformedResponse(source.into()),
            ServiceErrorSource::Upstream,
            context,
        )
    }

    pub fn from_unknown_close_update<S: Into<String>, C: Into<Cow<'static, str>>>(
        update: S,
        context: C,
    ) -> Self {
        Self::new(
            LnClientErrorSourceKind::UnknownCloseUpdate(update.into()),
            ServiceErrorSource::Upstream,
            context,
        )
    }

    pub fn from_timeout_error<C: Into<Cow<'static, str>>>(
        esource: ServiceErrorSource,
        context: C,
    ) -> Self {
        Self::new(LnClientErrorSourceKind::Timeout, esource, context)
    }

    pub fn context(&self) -> &str {
        self.context.as_ref()
    }

    pub fn source(&self) -> &LnClientErrorSourceKind {
        &self.source
    }

    pub fn esource(&self) -> ServiceErrorSource {
        self.esource
    }

    /// The call was torn down because the caller withdrew, not because it
    /// failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            &self.source,
            LnClientErrorSourceKind::TonicError(status) if status.code() == Code::Cancelled
        )
    }

    fn from_tonic_code(code: Code) -> ServiceErrorSource {
        match code {
            Code::InvalidArgument | Code::OutOfRange | Code::AlreadyExists => {
                ServiceErrorSource::Downstream
            }

            _ => ServiceErrorSource::Upstream,
        }
    }
}

impl HasServiceErrorSource for LnClientError {
    fn get_service_error_source(&self) -> ServiceErrorSource {
        self.esource
    }
}
