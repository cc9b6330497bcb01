// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the preview handler: method calls, their argument
// bag, and page geometry.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{PreviewError, Result};

/// Correlates the log lines of one dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operations understood by the preview plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `getNumberOfPages(filePath, clearCacheDir)`
    GetNumberOfPages,
    /// `getPage(filePath, pageNumber)`
    GetPage,
    /// `clearCacheDir()`
    ClearCacheDir,
    /// Anything else; answered with "not implemented".
    Unknown(String),
}

impl Method {
    pub const GET_NUMBER_OF_PAGES: &'static str = "getNumberOfPages";
    pub const GET_PAGE: &'static str = "getPage";
    pub const CLEAR_CACHE_DIR: &'static str = "clearCacheDir";

    /// Parse a wire method name. Matching is exact, as on the channel.
    pub fn parse(name: &str) -> Self {
        match name {
            Self::GET_NUMBER_OF_PAGES => Self::GetNumberOfPages,
            Self::GET_PAGE => Self::GetPage,
            Self::CLEAR_CACHE_DIR => Self::ClearCacheDir,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::GetNumberOfPages => Self::GET_NUMBER_OF_PAGES,
            Self::GetPage => Self::GET_PAGE,
            Self::ClearCacheDir => Self::CLEAR_CACHE_DIR,
            Self::Unknown(name) => name,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named operation plus its loosely typed argument bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// A call with no arguments.
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }

    pub fn parsed_method(&self) -> Method {
        Method::parse(&self.method)
    }

    /// Look up and decode one argument. Returns `None` when the key is
    /// absent, null, or holds a value of the wrong type.
    pub fn argument<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.arguments
            .get(key)
            .filter(|v| !v.is_null())
            .and_then(|v| T::deserialize(v).ok())
    }

    /// Like [`MethodCall::argument`] but a missing value is an error.
    pub fn required_argument<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.argument(key).ok_or_else(|| {
            PreviewError::InvalidArgument(format!(
                "`{}` requires argument `{}`",
                self.method, key
            ))
        })
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Whether both sides are finite and positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}
