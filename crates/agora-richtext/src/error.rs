use miette::Diagnostic;

use crate::runs::PayloadViolation;

/// Errors from decoding stored content outside the total codec paths.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ContentError {
    #[error("stored content is not valid JSON: {0}")]
    #[diagnostic(
        code(agora::content::json),
        help("content fields hold JSON objects, arrays or strings")
    )]
    Json(#[from] serde_json::Error),

    #[error("payload breaks a run invariant: {0}")]
    #[diagnostic(
        code(agora::content::payload),
        help("normalize the payload before storing it")
    )]
    Payload(#[from] PayloadViolation),
}
