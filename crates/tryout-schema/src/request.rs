//! Package requests parsed from positional arguments.
//!
//! An argument is `<name>`, `<name>@<range>`, or either of those followed by
//! `=<alias>`. Scoped names keep their leading `@`: `@scope/pkg@1=pkg`.

use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a package argument.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    /// The argument has no package name before `@`/`=`.
    #[error("Invalid package specifier '{0}': missing package name")]
    MissingName(String),

    /// The argument ends with `@`.
    #[error("Invalid package specifier '{0}': missing version after @")]
    MissingVersion(String),

    /// The argument ends with `=`.
    #[error("Invalid package specifier '{0}': missing alias after =")]
    MissingAlias(String),
}

/// A package name as published in the registry (e.g. `left-pad`, `@scope/pkg`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Wrap a registry name without normalization.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A binding name usable as a JavaScript identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias(String);

impl Alias {
    /// Sanitize arbitrary text into an identifier.
    ///
    /// Every character other than an ASCII letter, digit, `_` or `$` becomes
    /// `_`, and a leading digit gets a `_` prefix.
    pub fn sanitize(raw: &str) -> Self {
        let mut out: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            out.insert(0, '_');
        }
        Self(out)
    }

    /// Return the alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One package the user asked to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    /// Registry name; also the directory name under `node_modules`.
    pub name: PackageName,
    /// Optional version range, passed verbatim to the installer.
    pub version: Option<String>,
    /// Name the loaded value is bound to in the session.
    pub alias: Alias,
}

impl PackageRequest {
    /// Parse a positional argument like `lodash`, `lodash@4=_` or `@scope/pkg`.
    pub fn parse(arg: &str) -> Result<Self, RequestError> {
        let (spec, alias) = match arg.split_once('=') {
            Some((_, "")) => return Err(RequestError::MissingAlias(arg.to_string())),
            Some((spec, alias)) => (spec, Some(alias)),
            None => (arg, None),
        };

        // Skip the scope marker so `@scope/pkg` is not read as a version.
        let search_from = usize::from(spec.starts_with('@'));
        let (name, version) = match spec[search_from..].find('@') {
            Some(pos) => {
                let at = pos + search_from;
                (&spec[..at], Some(&spec[at + 1..]))
            }
            None => (spec, None),
        };

        if name.is_empty() || (name.starts_with('@') && !name.contains('/')) {
            return Err(RequestError::MissingName(arg.to_string()));
        }
        if version == Some("") {
            return Err(RequestError::MissingVersion(arg.to_string()));
        }

        Ok(Self {
            name: PackageName::new(name),
            version: version.map(str::to_string),
            alias: Alias::sanitize(alias.unwrap_or(name)),
        })
    }

    /// The argument handed to the package manager (`name` or `name@range`).
    pub fn install_target(&self) -> String {
        match &self.version {
            Some(v) => format!("{}@{v}", self.name),
            None => self.name.to_string(),
        }
    }
}

/// Parse every positional argument, keeping the last request per package name.
pub fn collect_requests<I, S>(args: I) -> Result<Vec<PackageRequest>, RequestError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut requests: Vec<PackageRequest> = Vec::new();
    for arg in args {
        let request = PackageRequest::parse(arg.as_ref())?;
        if let Some(existing) = requests.iter_mut().find(|r| r.name == request.name) {
            *existing = request;
        } else {
            requests.push(request);
        }
    }
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let req = PackageRequest::parse("lodash").unwrap();
        assert_eq!(req.name.as_str(), "lodash");
        assert_eq!(req.version, None);
        assert_eq!(req.alias.as_str(), "lodash");
    }

    #[test]
    fn test_parse_alias_is_sanitized() {
        let req = PackageRequest::parse("right-pad=r.p").unwrap();
        assert_eq!(req.name.as_str(), "right-pad");
        assert_eq!(req.alias.as_str(), "r_p");
    }

    #[test]
    fn test_parse_default_alias_from_name() {
        let req = PackageRequest::parse("left-pad").unwrap();
        assert_eq!(req.alias.as_str(), "left_pad");
        assert!(!req.alias.as_str().contains(['-', '.']));
    }

    #[test]
    fn test_parse_versioned() {
        let req = PackageRequest::parse("lodash@4.17=_").unwrap();
        assert_eq!(req.name.as_str(), "lodash");
        assert_eq!(req.version.as_deref(), Some("4.17"));
        assert_eq!(req.alias.as_str(), "_");
        assert_eq!(req.install_target(), "lodash@4.17");
    }

    #[test]
    fn test_parse_scoped() {
        let req = PackageRequest::parse("@sindresorhus/is").unwrap();
        assert_eq!(req.name.as_str(), "@sindresorhus/is");
        assert_eq!(req.version, None);
        assert_eq!(req.alias.as_str(), "_sindresorhus_is");

        let req = PackageRequest::parse("@sindresorhus/is@5").unwrap();
        assert_eq!(req.name.as_str(), "@sindresorhus/is");
        assert_eq!(req.version.as_deref(), Some("5"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            PackageRequest::parse("@1.0"),
            Err(RequestError::MissingName(_))
        ));
        assert!(matches!(
            PackageRequest::parse("=x"),
            Err(RequestError::MissingName(_))
        ));
        assert!(matches!(
            PackageRequest::parse("jq@"),
            Err(RequestError::MissingVersion(_))
        ));
        assert!(matches!(
            PackageRequest::parse("jq="),
            Err(RequestError::MissingAlias(_))
        ));
    }

    #[test]
    fn test_sanitize_is_deterministic() {
        for raw in ["socket.io-client", "a-b.c", "7zip", "ok_$"] {
            assert_eq!(Alias::sanitize(raw), Alias::sanitize(raw));
        }
        assert_eq!(Alias::sanitize("socket.io-client").as_str(), "socket_io_client");
        assert_eq!(Alias::sanitize("7zip").as_str(), "_7zip");
        assert_eq!(Alias::sanitize("ok_$").as_str(), "ok_$");
    }

    #[test]
    fn test_collect_requests_last_wins() {
        let reqs = collect_requests(["left-pad", "right-pad=rp", "left-pad=lp"]).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].alias.as_str(), "lp");
        assert_eq!(reqs[1].alias.as_str(), "rp");
    }
}
