//! Canonical package identity used across the protocol boundary.

use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// Field separator of the serialized id token.
pub const ID_DELIMITER: char = ';';

/// Canonical external identity of one package instance:
/// (name, version, architecture, origin) serialized as a single
/// `name;version;arch;origin` token.
///
/// The origin field is empty for local or unavailable packages, but it is
/// always present so the token splits into exactly four fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId {
    pub name: String,
    pub version: String,
    pub architecture: String,
    pub origin: String,
}

impl PackageId {
    /// Build an id from its four fields.
    ///
    /// Fields embedding the delimiter are rejected; anything else would make
    /// two distinct tuples render to the same token.
    pub fn new(
        name: &str,
        version: &str,
        architecture: &str,
        origin: &str,
    ) -> Result<Self, QueryError> {
        for field in [name, version, architecture, origin] {
            if field.contains(ID_DELIMITER) {
                return Err(QueryError::MalformedIdentity(format!(
                    "field {:?} contains the id delimiter",
                    field
                )));
            }
        }
        Ok(PackageId {
            name: name.to_string(),
            version: version.to_string(),
            architecture: architecture.to_string(),
            origin: origin.to_string(),
        })
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.name, self.version, self.architecture, self.origin
        )
    }
}

impl FromStr for PackageId {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(ID_DELIMITER).collect();
        if parts.len() != 4 {
            return Err(QueryError::MalformedIdentity(s.to_string()));
        }
        Ok(PackageId {
            name: parts[0].to_string(),
            version: parts[1].to_string(),
            architecture: parts[2].to_string(),
            origin: parts[3].to_string(),
        })
    }
}
