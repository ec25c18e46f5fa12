//! Version token resolution.
//!
//! Callers supply the version as a free-form path segment. The literal
//! `"latest"` and any non-negative integer are meaningful; everything else
//! (negative numbers, garbage) deliberately falls back to the latest
//! version instead of rejecting the request. Upstream clients depend on
//! this leniency, so it must not be tightened without a breaking release.

use serde::Serialize;

/// Literal sentinel accepted in place of a concrete version number.
pub const LATEST_TOKEN: &str = "latest";

/// A normalized version request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolvedVersion {
    /// Fetch whatever version the distribution network reports as current.
    Latest,
    /// Fetch a specific non-negative version.
    Exact(u32),
}

impl ResolvedVersion {
    /// The concrete version, if one was requested.
    pub fn exact(&self) -> Option<u32> {
        match self {
            Self::Latest => None,
            Self::Exact(v) => Some(*v),
        }
    }
}

impl std::fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "{}", LATEST_TOKEN),
            Self::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// Resolve a raw version token. Never fails.
pub fn resolve(token: &str) -> ResolvedVersion {
    if token == LATEST_TOKEN {
        return ResolvedVersion::Latest;
    }
    match token.parse::<i64>() {
        Ok(v) if (0..=u32::MAX as i64).contains(&v) => ResolvedVersion::Exact(v as u32),
        // Negative or unparseable tokens fall back to latest by design.
        _ => ResolvedVersion::Latest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_latest_literal() {
        assert_eq!(resolve("latest"), ResolvedVersion::Latest);
    }

    #[test]
    fn test_resolve_numeric() {
        assert_eq!(resolve("7"), ResolvedVersion::Exact(7));
        assert_eq!(resolve("0"), ResolvedVersion::Exact(0));
        assert_eq!(resolve("512"), ResolvedVersion::Exact(512));
    }

    #[test]
    fn test_resolve_negative_falls_back() {
        assert_eq!(resolve("-1"), ResolvedVersion::Latest);
        assert_eq!(resolve("-512"), ResolvedVersion::Latest);
    }

    #[test]
    fn test_resolve_garbage_falls_back() {
        assert_eq!(resolve("abc"), ResolvedVersion::Latest);
        assert_eq!(resolve(""), ResolvedVersion::Latest);
        assert_eq!(resolve("1.5"), ResolvedVersion::Latest);
        assert_eq!(resolve("Latest"), ResolvedVersion::Latest); // case-sensitive sentinel
    }

    #[test]
    fn test_resolve_out_of_range_falls_back() {
        assert_eq!(resolve("99999999999999999999"), ResolvedVersion::Latest);
        assert_eq!(resolve(&(u32::MAX as i64 + 1).to_string()), ResolvedVersion::Latest);
    }

    #[test]
    fn test_exact_accessor() {
        assert_eq!(resolve("42").exact(), Some(42));
        assert_eq!(resolve("latest").exact(), None);
    }
}
