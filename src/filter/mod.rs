//! Visibility filters over package snapshots.
//!
//! Filters arrive from the calling engine as a single `;`-separated token
//! (e.g. `"installed;~devel"`) with the literal sentinel `none` meaning
//! "no filtering". They compose by logical AND. Tokens outside the known
//! vocabulary are skipped rather than rejected so that a newer engine can
//! send filter kinds this evaluator does not know about yet.

use std::fmt;

use crate::package::PackageInstance;

/// Sentinel filter token meaning "no filtering".
pub const FILTER_NONE: &str = "none";

/// One visibility predicate from the closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Installed,
    NotInstalled,
    Gui,
    NotGui,
    Development,
    NotDevelopment,
}

impl Filter {
    /// Parse a single filter token. Returns `None` for unknown tokens;
    /// the caller decides whether to skip or report them.
    pub fn parse(token: &str) -> Option<Filter> {
        match token {
            "installed" => Some(Filter::Installed),
            "~installed" => Some(Filter::NotInstalled),
            "gui" => Some(Filter::Gui),
            "~gui" => Some(Filter::NotGui),
            "devel" => Some(Filter::Development),
            "~devel" => Some(Filter::NotDevelopment),
            _ => None,
        }
    }

    /// Whether a package passes this predicate.
    pub fn matches(&self, pkg: &PackageInstance) -> bool {
        match self {
            Filter::Installed => pkg.is_installed,
            Filter::NotInstalled => !pkg.is_installed,
            Filter::Gui => pkg.has_gui(),
            Filter::NotGui => !pkg.has_gui(),
            Filter::Development => pkg.is_devel(),
            Filter::NotDevelopment => !pkg.is_devel(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Installed => write!(f, "installed"),
            Filter::NotInstalled => write!(f, "~installed"),
            Filter::Gui => write!(f, "gui"),
            Filter::NotGui => write!(f, "~gui"),
            Filter::Development => write!(f, "devel"),
            Filter::NotDevelopment => write!(f, "~devel"),
        }
    }
}

/// An ordered set of visibility filters combined by AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// The empty set: every package is visible.
    pub fn none() -> Self {
        FilterSet::default()
    }

    /// Parse a `;`-separated filter token.
    ///
    /// The literal sentinel `none` (and the empty string) yield the empty
    /// set. Unknown tokens are skipped and logged; they are a
    /// forward-compatibility concern, not an error.
    pub fn parse(token: &str) -> Self {
        if token.is_empty() || token == FILTER_NONE {
            return FilterSet::none();
        }
        let mut filters = Vec::new();
        for part in token.split(';') {
            match Filter::parse(part) {
                Some(filter) => filters.push(filter),
                None => log::debug!("Skipping unknown filter token {:?}", part),
            }
        }
        FilterSet { filters }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether a package should be exposed to the query carrying this set.
    /// Short-circuit AND over the individual predicates.
    pub fn is_visible(&self, pkg: &PackageInstance) -> bool {
        self.filters.iter().all(|filter| filter.matches(pkg))
    }
}
