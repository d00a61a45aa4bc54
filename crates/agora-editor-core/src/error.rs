use miette::Diagnostic;

use crate::surface::SurfaceError;

/// Errors from the editor controller.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum EditorError {
    #[error("mention has no usable nickname")]
    #[diagnostic(code(agora::editor::invalid_mention))]
    InvalidMention,

    #[error("unknown format command `{name}`")]
    #[diagnostic(
        code(agora::editor::unknown_command),
        help("expected one of bold, italic, underline, strike, header, list, align, blockquote, code-block, indent, clean")
    )]
    UnknownCommand { name: String },

    #[error("invalid value {value:?} for format command `{name}`")]
    #[diagnostic(code(agora::editor::invalid_command_value))]
    InvalidCommandValue { name: String, value: Option<String> },

    #[error("host surface failed: {0}")]
    #[diagnostic(code(agora::editor::surface))]
    Surface(#[from] SurfaceError),
}
