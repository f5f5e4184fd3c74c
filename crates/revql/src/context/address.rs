//! Address parsing and path normalization.
//!
//! An address is either `git://path@revision` or a bare filesystem path.
//! Parsing never touches the disk; splitting the path into repository root
//! and in-repository file happens later, in the resolver.

use crate::error::{Result, RevqlError};

/// The only scheme tag revql understands.
pub const SCHEME: &str = "git://";

/// Revision used when an address does not name one.
pub const DEFAULT_REVISION: &str = "HEAD";

/// An address split into its path and revision, not yet checked against disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Path portion, as written. Used as the starting point for repository
    /// discovery, so `..` is allowed here.
    pub repository_path_hint: String,
    /// Revision from the `@` suffix, or the fallback.
    pub revision: String,
    /// True when the revision came from a non-empty `@` suffix.
    pub embedded_revision: bool,
}

impl ParsedAddress {
    /// Parses `raw`, using `fallback_revision` when no revision is embedded.
    ///
    /// Bare paths never carry a revision: an `@` in a bare path is part of the
    /// path. In `git://` form the `@` is mandatory, an empty suffix takes the
    /// fallback.
    pub fn parse(raw: &str, fallback_revision: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(RevqlError::address(raw, "empty address"));
        }

        let Some(rest) = raw.strip_prefix(SCHEME) else {
            if let Some(scheme) = scheme_tag(raw) {
                return Err(RevqlError::address(
                    raw,
                    format!("unsupported scheme '{scheme}://', only {SCHEME} is supported"),
                ));
            }
            return Ok(Self {
                repository_path_hint: raw.to_string(),
                revision: fallback_revision.to_string(),
                embedded_revision: false,
            });
        };

        let Some((path, revision)) = rest.rsplit_once('@') else {
            return Err(RevqlError::address(
                raw,
                "missing '@revision' suffix (use '@HEAD' for the current revision)",
            ));
        };

        if revision.chars().any(char::is_control) {
            return Err(RevqlError::address(raw, "revision contains control characters"));
        }

        let path = if path.is_empty() { "." } else { path };
        let (revision, embedded_revision) = if revision.is_empty() {
            (fallback_revision.to_string(), false)
        } else {
            (revision.to_string(), true)
        };

        Ok(Self {
            repository_path_hint: path.to_string(),
            revision,
            embedded_revision,
        })
    }
}

/// Returns the scheme name if `raw` starts with `<scheme>://`.
fn scheme_tag(raw: &str) -> Option<&str> {
    let (scheme, _) = raw.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Normalizes a full address into its canonical `path@revision` form.
///
/// The scheme tag is dropped, the revision defaults to `HEAD`, and the path
/// goes through [`normalize_path`]. The output is a fixed point:
/// `normalize(&normalize(p)?)? == normalize(p)?`.
pub fn normalize(raw: &str) -> Result<String> {
    let without_scheme = match scheme_tag(raw) {
        Some(scheme) => &raw[scheme.len() + 3..],
        None => raw,
    };

    let (path, revision) = match without_scheme.rsplit_once('@') {
        Some((path, revision)) if !revision.is_empty() => (path, revision),
        Some((path, _)) => (path, DEFAULT_REVISION),
        None => (without_scheme, DEFAULT_REVISION),
    };

    Ok(format!("{}@{}", normalize_path(path)?, revision))
}

/// Normalizes a path that is interpreted inside a repository.
///
/// Strips leading `./` and `/`, trailing `/`, collapses repeated `/`, and
/// rejects any `..` segment. Backslashes, inner `./` segments and non-ASCII
/// text are kept verbatim.
pub fn normalize_path(path: &str) -> Result<String> {
    let mut s = path;
    loop {
        let before = s.len();
        while let Some(rest) = s.strip_prefix("./") {
            s = rest;
        }
        s = s.trim_start_matches('/');
        if s.len() == before {
            break;
        }
    }
    let s = s.trim_end_matches('/');
    if s == "." {
        return Ok(String::new());
    }

    let mut out = String::with_capacity(s.len());
    let mut last_slash = false;
    for c in s.chars() {
        if c == '/' {
            if !last_slash {
                out.push(c);
            }
            last_slash = true;
        } else {
            out.push(c);
            last_slash = false;
        }
    }

    if out.split('/').any(|segment| segment == "..") {
        return Err(RevqlError::PathSecurity {
            path: path.to_string(),
        });
    }

    Ok(out)
}

/// Builds an address from its parts, removing duplicate slashes at the join.
pub fn build_address(repo_path: &str, file_path: &str, revision: &str) -> String {
    let repo = repo_path.trim_end_matches('/');
    let file = file_path.trim_start_matches('/');
    if file.is_empty() {
        format!("{SCHEME}{repo}@{revision}")
    } else {
        format!("{SCHEME}{repo}/{file}@{revision}")
    }
}
