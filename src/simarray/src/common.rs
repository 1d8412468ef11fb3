// Copyright 2021 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorCode {
    OutOfRange,
    UnsupportedOperation,
    ShapeMismatch,
    InvalidShape,
    BadDimension,
    WorkspaceTooSmall,
    BadArgument,
    RoutineFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            OutOfRange => "out_of_range",
            UnsupportedOperation => "unsupported_operation",
            ShapeMismatch => "shape_mismatch",
            InvalidShape => "invalid_shape",
            BadDimension => "bad_dimension",
            WorkspaceTooSmall => "workspace_too_small",
            BadArgument => "bad_argument",
            RoutineFailed => "routine_failed",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorKind {
    Array,
    Workspace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Array => "ArrayError",
            ErrorKind::Workspace => "WorkspaceError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! array_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Array, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Array, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! workspace_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Workspace, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Workspace, ErrorCode::$code, None))
    }};
}

#[test]
fn test_error_display() {
    let err: Result<()> = array_err!(ShapeMismatch, "expected 6 elements, got 4".to_string());
    let err = err.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Array);
    assert_eq!(err.code, ErrorCode::ShapeMismatch);
    assert_eq!(
        format!("{err}"),
        "ArrayError{shape_mismatch: expected 6 elements, got 4}"
    );

    let err: Result<()> = workspace_err!(WorkspaceTooSmall);
    assert_eq!(
        format!("{}", err.unwrap_err()),
        "WorkspaceError{workspace_too_small}"
    );
}

#[test]
fn test_error_code_names() {
    assert_eq!(ErrorCode::OutOfRange.to_string(), "out_of_range");
    assert_eq!(
        ErrorCode::UnsupportedOperation.to_string(),
        "unsupported_operation"
    );
    assert_eq!(ErrorCode::BadDimension.to_string(), "bad_dimension");
    assert_eq!(ErrorCode::RoutineFailed.to_string(), "routine_failed");
}

#[test]
fn test_every_code_has_a_distinct_name() {
    use ErrorCode::*;
    let names: std::collections::HashSet<String> = [
        OutOfRange,
        UnsupportedOperation,
        ShapeMismatch,
        InvalidShape,
        BadDimension,
        WorkspaceTooSmall,
        BadArgument,
        RoutineFailed,
    ]
    .iter()
    .map(|code| code.to_string())
    .collect();
    assert_eq!(names.len(), 8);
}
