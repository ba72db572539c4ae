use core::convert::Infallible;
use core::str::FromStr;

/// HTTP method of an inbound request.
///
/// Method names are case-insensitive on input and always rendered lowercase,
/// matching the names used for per-method hooks (`get`, `post`, ...).
/// Anything outside the known set is kept as [`Method::Other`] so that the
/// fallback rules (default permissions, default status) still apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Other(String),
}

/// Read/write classification used by the general permission hooks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
            Method::Other(name) => name,
        }
    }

    /// `get` reads, `post`/`put`/`patch`/`delete` write; everything else is
    /// unclassified and falls back to the defaults.
    pub fn access(&self) -> Option<Access> {
        match self {
            Method::Get => Some(Access::Read),
            Method::Post | Method::Put | Method::Patch | Method::Delete => Some(Access::Write),
            Method::Head | Method::Options | Method::Other(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Method::Other(_))
    }
}

impl FromStr for Method {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Ok(match lowered.as_str() {
            "get" => Method::Get,
            "post" => Method::Post,
            "put" => Method::Put,
            "patch" => Method::Patch,
            "delete" => Method::Delete,
            "head" => Method::Head,
            "options" => Method::Options,
            _ => Method::Other(lowered),
        })
    }
}

impl From<&str> for Method {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        }
    }
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
