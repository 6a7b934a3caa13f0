//! Location providers
//!
//! A provider answers "where is the symbol at this position referenced (or
//! implemented)?". `Ok(None)` means the provider cannot answer for this
//! position at all, which is different from an empty answer.

use std::future::Future;
use std::pin::Pin;

use crate::core::error::TreeError;
use crate::core::location::{FileId, Location, Position, QueryKind};

pub type LocationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<Vec<Location>>, TreeError>> + Send + 'a>>;

pub trait LocationProvider: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    fn locations<'a>(
        &'a self,
        file: &'a FileId,
        position: Position,
        kind: QueryKind,
    ) -> LocationFuture<'a>;
}
