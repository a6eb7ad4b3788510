//! Read-only snapshot of one package's state within a cache.

use serde::{Deserialize, Serialize};

/// Section-path tails that classify a package as graphical.
const GUI_SECTIONS: [&str; 3] = ["x11", "gnome", "kde"];

/// Section-path tails that classify a package as a development package.
const DEVEL_SECTIONS: [&str; 2] = ["devel", "libdevel"];

/// Snapshot of one package's query-relevant state.
///
/// Instances are borrowed from the cache for the duration of a single query
/// and never mutated; `name` is unique within one cache snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PackageInstance {
    pub name: String,
    /// Currently installed version, if any.
    #[serde(default)]
    pub installed_version: Option<String>,
    /// Best installable version. Non-empty for any valid search result.
    pub candidate_version: String,
    pub architecture: String,
    /// Origin label of the candidate version; empty for local packages.
    #[serde(default)]
    pub origin: String,
    /// Category path, e.g. "admin" or "x11/games".
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub is_installed: bool,
    /// One-line summary; duplicated as the first line of `description`.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    /// Download size in bytes.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub homepage: Option<String>,
}

impl PackageInstance {
    /// Last segment of the section path, lower-cased.
    fn section_tail(&self) -> String {
        self.section
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Whether the package provides a graphical interface, judged by its
    /// section tail.
    pub fn has_gui(&self) -> bool {
        GUI_SECTIONS.contains(&self.section_tail().as_str())
    }

    /// Whether the package is a development package, judged by its name
    /// suffix or section tail.
    pub fn is_devel(&self) -> bool {
        self.name.ends_with("-dev")
            || self.name.ends_with("-dbg")
            || DEVEL_SECTIONS.contains(&self.section_tail().as_str())
    }
}
