// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Unified error type for resource access.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found: {package}/{name}")]
    NotFound { package: String, name: String },

    #[error("no source code for {0}")]
    SourceNotFound(String),

    #[error("resource has no filesystem path: {package}/{name}")]
    PathUnsupported { package: String, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error decoding resource data: {0}")]
    Decode(String),

    #[error("invalid resources snapshot: {0}")]
    InvalidSnapshot(String),
}

impl ResourceError {
    pub(crate) fn not_found(package: &str, name: &str) -> Self {
        Self::NotFound {
            package: package.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn path_unsupported(package: &str, name: &str) -> Self {
        Self::PathUnsupported {
            package: package.to_string(),
            name: name.to_string(),
        }
    }

    /// The [std::io::ErrorKind] this error maps to, if any.
    ///
    /// Allows callers to treat missing resources like missing files.
    pub fn kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::NotFound { .. } | Self::SourceNotFound(_) => Some(std::io::ErrorKind::NotFound),
            Self::Io(e) => Some(e.kind()),
            Self::PathUnsupported { .. } | Self::Decode(_) | Self::InvalidSnapshot(_) => None,
        }
    }
}

impl From<ResourceError> for std::io::Error {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::Io(e) => e,
            e => {
                let kind = e.kind().unwrap_or(std::io::ErrorKind::Other);
                std::io::Error::new(kind, e)
            }
        }
    }
}

/// Result type for resource operations.
pub type Result<T, E = ResourceError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(
            ResourceError::not_found("pkg", "a.txt").kind(),
            Some(std::io::ErrorKind::NotFound)
        );
        assert_eq!(ResourceError::path_unsupported("pkg", "a.txt").kind(), None);
    }

    #[test]
    fn test_into_io_error() {
        let e: std::io::Error = ResourceError::not_found("pkg", "missing").into();
        assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(e.to_string(), "resource not found: pkg/missing");
    }

    #[test]
    fn test_source_not_found() {
        let e = ResourceError::SourceNotFound("pkg.module".to_string());
        assert_eq!(e.kind(), Some(std::io::ErrorKind::NotFound));
        assert_eq!(e.to_string(), "no source code for pkg.module");
    }
}
