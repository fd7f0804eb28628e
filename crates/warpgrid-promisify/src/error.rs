//! Error types raised by the stub response builder.

use std::fmt;

use thiserror::Error;

/// Errors a handler can hit while driving a [`ResponseBuilder`](crate::ResponseBuilder).
///
/// Both variants are raised synchronously from the builder method that
/// the handler called. Handlers propagate them with `?`, so they reach the
/// caller exactly like any other handler failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("This package currently does not support the '{}' {} on the response object", .0.name(), .0.kind())]
    UnsupportedOperation(Operation),

    #[error("Call signature arg1: '{field}', arg2: '{value}' not supported.")]
    InvalidArgument {
        field: &'static str,
        value: &'static str,
    },
}

/// Whether an unsupported member is a method or an accessor on the
/// mimicked response object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Function,
    Property,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Function => f.write_str("function"),
            OperationKind::Property => f.write_str("property"),
        }
    }
}

/// Response-object members that the stub deliberately rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    App,
    HeadersSent,
    Locals,
    RawBody,
    Append,
    Attachment,
    Cookie,
    ClearCookie,
    Download,
    Format,
    Get,
    Json,
    Jsonp,
    Links,
    Location,
    Redirect,
    Render,
    SendFile,
    SendStatus,
    Type,
    Vary,
}

impl Operation {
    /// Member name as handlers know it on the response object.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::App => "app",
            Operation::HeadersSent => "headersSent",
            Operation::Locals => "locals",
            Operation::RawBody => "rawBody",
            Operation::Append => "append",
            Operation::Attachment => "attachment",
            Operation::Cookie => "cookie",
            Operation::ClearCookie => "clearCookie",
            Operation::Download => "download",
            Operation::Format => "format",
            Operation::Get => "get",
            Operation::Json => "json",
            Operation::Jsonp => "jsonp",
            Operation::Links => "links",
            Operation::Location => "location",
            Operation::Redirect => "redirect",
            Operation::Render => "render",
            Operation::SendFile => "sendFile",
            Operation::SendStatus => "sendStatus",
            Operation::Type => "type",
            Operation::Vary => "vary",
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::App | Operation::HeadersSent | Operation::Locals | Operation::RawBody => {
                OperationKind::Property
            }
            _ => OperationKind::Function,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Operation> for ResponseError {
    fn from(op: Operation) -> Self {
        ResponseError::UnsupportedOperation(op)
    }
}
