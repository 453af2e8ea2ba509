//! Seam for services that turn an uploaded document into a protocol.

use crate::protocol::{ProtocolDocument, parse_document};
use crate::storage::BoxFuture;

/// Extracts a candidate protocol from a document (PDF, text, ...).
///
/// Errors are user-facing messages from the service.
#[cfg(not(target_arch = "wasm32"))]
pub trait ProtocolExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        file: &'a [u8],
        file_name: &'a str,
        context: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ProtocolDocument, String>>;
}

/// Extracts a candidate protocol from a document (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait ProtocolExtractor {
    fn extract<'a>(
        &'a self,
        file: &'a [u8],
        file_name: &'a str,
        context: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ProtocolDocument, String>>;
}

/// Extractor for files that already hold an interchange document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl ProtocolExtractor for JsonExtractor {
    fn extract<'a>(
        &'a self,
        file: &'a [u8],
        file_name: &'a str,
        _context: Option<&'a str>,
    ) -> BoxFuture<'a, Result<ProtocolDocument, String>> {
        Box::pin(async move {
            let text = std::str::from_utf8(file)
                .map_err(|_| format!("{} is not UTF-8 text", file_name))?;
            parse_document(text).map_err(|e| format!("{}: {}", file_name, e))
        })
    }
}
