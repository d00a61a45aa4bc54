//! Toolbar format commands.

use agora_richtext::{Align, ListKind};

use crate::error::EditorError;

/// A toggling format command as issued by a toolbar button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strike,
    Header(u8),
    List(ListKind),
    /// `None` is left alignment.
    Align(Option<Align>),
    Blockquote,
    CodeBlock,
    /// Relative indent change.
    Indent(i8),
    Clean,
}

impl FormatCommand {
    /// Map a toolbar command name and optional value to a command.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, EditorError> {
        let invalid = || EditorError::InvalidCommandValue {
            name: name.to_string(),
            value: value.map(str::to_string),
        };
        let value = value.map(str::trim);

        let command = match name {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strike" => Self::Strike,
            "blockquote" => Self::Blockquote,
            "code-block" => Self::CodeBlock,
            "clean" => Self::Clean,
            "header" => match value {
                Some("1") => Self::Header(1),
                Some("2") => Self::Header(2),
                _ => return Err(invalid()),
            },
            "list" => value.and_then(ListKind::parse).map(Self::List).ok_or_else(invalid)?,
            "align" => match value {
                None | Some("") | Some("left") => Self::Align(None),
                Some(raw) => Self::Align(Some(Align::parse(raw).ok_or_else(invalid)?)),
            },
            "indent" => match value {
                Some("+1") | Some("1") => Self::Indent(1),
                Some("-1") => Self::Indent(-1),
                _ => return Err(invalid()),
            },
            _ => {
                return Err(EditorError::UnknownCommand {
                    name: name.to_string(),
                });
            }
        };
        Ok(command)
    }
}
