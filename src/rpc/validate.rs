//! Metadata presence check for inbound gRPC calls.

use serde::Serialize;
use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

use super::{RpcFuture, UnaryInfo, UnaryInterceptor, UnaryNext};
use crate::correlation::CORRELATION_ID_HEADER;

/// Rejects calls that arrive with no metadata at all.
///
/// Only presence is checked: metadata without a correlation key still passes,
/// and the access log shows `-` for it. Usable both as a
/// [`UnaryInterceptor`] and as a plain tonic interceptor:
///
/// ```rust,ignore
/// UsersServer::with_interceptor(service, RequireMetadata)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireMetadata;

impl RequireMetadata {
    pub fn check(metadata: &MetadataMap) -> Result<(), Status> {
        if metadata.is_empty() {
            return Err(Status::invalid_argument(format!(
                "{CORRELATION_ID_HEADER} is missing from metadata"
            )));
        }
        Ok(())
    }
}

impl UnaryInterceptor for RequireMetadata {
    fn intercept<'a, T, R>(
        &'a self,
        _info: &'a UnaryInfo,
        req: Request<T>,
        next: UnaryNext<'a, T, R>,
    ) -> RpcFuture<'a, R>
    where
        T: Serialize + Send + 'a,
        R: Send + 'a,
    {
        match Self::check(req.metadata()) {
            Ok(()) => next.run(req),
            Err(status) => Box::pin(async move { Err(status) }),
        }
    }
}

impl tonic::service::Interceptor for RequireMetadata {
    fn call(&mut self, req: Request<()>) -> Result<Request<()>, Status> {
        Self::check(req.metadata())?;
        Ok(req)
    }
}
