//! Suite Loading
//!
//! Discovery hands the session a sequence of paths; a loader resolves
//! each path into executed registration calls. The session does not
//! care how: the standard loader looks paths up in the static suite
//! registry, tests substitute closures.

use thiserror::Error;

use crate::session::Harness;
use crate::SuiteDef;

/// Why a path could not be loaded. Load errors are wiring problems,
/// not benchmark failures; callers abort discovery on them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    /// No registered suite answers to the path.
    #[error("no registered suite matches '{0}'")]
    NotFound(String),
}

/// Resolves a discovered path into executed registrations.
pub trait SuiteLoader {
    /// Load `path`, executing its registration calls against `harness`
    /// before returning.
    fn load(&mut self, path: &str, harness: &Harness) -> Result<(), LoadError>;
}

impl<F> SuiteLoader for F
where
    F: FnMut(&str, &Harness) -> Result<(), LoadError>,
{
    fn load(&mut self, path: &str, harness: &Harness) -> Result<(), LoadError> {
        self(path, harness)
    }
}

/// Loads suites from the static registry populated by `suite!`.
///
/// A query matches a registered suite either exactly or by path
/// suffix, so `./suites/parse.rs` finds a suite registered as
/// `suites/parse.rs`.
#[derive(Debug, Default)]
pub struct RegistryLoader;

impl SuiteLoader for RegistryLoader {
    fn load(&mut self, path: &str, harness: &Harness) -> Result<(), LoadError> {
        let suite = inventory::iter::<SuiteDef>
            .into_iter()
            .find(|s| s.path == path || path.ends_with(s.path));
        match suite {
            Some(suite) => {
                tracing::debug!(path = suite.path, "running suite registrations");
                (suite.register)(harness);
                Ok(())
            }
            None => Err(LoadError::NotFound(path.to_string())),
        }
    }
}
