//! Signal sink toward the calling engine and result-record emission.

use async_trait::async_trait;
use std::fmt;

use crate::error::{ErrorKind, Outcome, QueryError};
use crate::package::{PackageId, PackageInstance};

/// Classification of an emitted result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Installed,
    Available,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Installed => write!(f, "installed"),
            ResultStatus::Available => write!(f, "available"),
        }
    }
}

/// Asynchronous signal sink for query output.
///
/// One query emits zero or more `on_result` signals (or exactly one
/// `on_description` for describe), at most one `on_error`, and always
/// exactly one terminating `on_finished`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Emitter: Send {
    async fn on_result(&mut self, status: ResultStatus, id: &PackageId, summary: &str);

    async fn on_description(
        &mut self,
        id: &PackageId,
        group: &str,
        license: &str,
        description: &str,
        homepage: &str,
        size: u64,
    );

    async fn on_error(&mut self, kind: ErrorKind, message: &str);

    async fn on_finished(&mut self, outcome: Outcome);
}

/// Identity of a package instance for the given view.
///
/// The installed view describes the currently installed instance: installed
/// version and an empty origin. Every other case describes the installation
/// candidate: candidate version and the candidate's origin label.
pub fn package_id(pkg: &PackageInstance, installed_view: bool) -> Result<PackageId, QueryError> {
    if installed_view && pkg.is_installed {
        let version = pkg
            .installed_version
            .as_deref()
            .unwrap_or(&pkg.candidate_version);
        PackageId::new(&pkg.name, version, &pkg.architecture, "")
    } else {
        PackageId::new(
            &pkg.name,
            &pkg.candidate_version,
            &pkg.architecture,
            &pkg.origin,
        )
    }
}

/// Emit one result record for a package under the given view.
pub async fn emit_package<E: Emitter>(
    emitter: &mut E,
    pkg: &PackageInstance,
    installed_view: bool,
) -> Result<(), QueryError> {
    let id = package_id(pkg, installed_view)?;
    let status = if installed_view && pkg.is_installed {
        ResultStatus::Installed
    } else {
        ResultStatus::Available
    };
    emitter.on_result(status, &id, &pkg.summary).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::{always, eq};

    fn vim() -> PackageInstance {
        PackageInstance {
            name: "vim".into(),
            installed_version: Some("1.0".into()),
            candidate_version: "2.0".into(),
            architecture: "amd64".into(),
            origin: "Debian".into(),
            is_installed: true,
            summary: "a text editor".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_package_id_installed_view() {
        let id = package_id(&vim(), true).unwrap();
        assert_eq!(id.to_string(), "vim;1.0;amd64;");
    }

    #[test]
    fn test_package_id_candidate_view() {
        let id = package_id(&vim(), false).unwrap();
        assert_eq!(id.to_string(), "vim;2.0;amd64;Debian");
    }

    #[test]
    fn test_package_id_installed_view_of_available_package() {
        let mut pkg = vim();
        pkg.is_installed = false;
        pkg.installed_version = None;
        // Without an installed instance the candidate is described.
        let id = package_id(&pkg, true).unwrap();
        assert_eq!(id.to_string(), "vim;2.0;amd64;Debian");
    }

    #[tokio::test]
    async fn test_emit_package_available_status() {
        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_result()
            .with(eq(ResultStatus::Available), always(), eq("a text editor"))
            .times(1)
            .returning(|_, _, _| ());

        emit_package(&mut emitter, &vim(), false).await.unwrap();
    }

    #[tokio::test]
    async fn test_emit_package_installed_status() {
        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_result()
            .with(eq(ResultStatus::Installed), always(), always())
            .times(1)
            .returning(|_, _, _| ());

        emit_package(&mut emitter, &vim(), true).await.unwrap();
    }
}
