//! Path context for failures while reading member files

use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Attach `action: path` context to any error result.
///
/// ```ignore
/// let content = fs.read_to_string(&path)
///     .with_path_context("read member records", &path)?;
/// let records: Vec<MemberRecord> = serde_json::from_str(&content)
///     .with_path_context("parse member records", &path)?;
/// ```
pub trait PathContextExt<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T, E> PathContextExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn given_io_error_when_adding_context_then_keeps_source() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));

        let err = result
            .with_path_context("read member records", Path::new("family.json"))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "operation failed: read member records: family.json"
        );
        match err {
            ApplicationError::OperationFailed { source, .. } => {
                assert!(source.downcast_ref::<io::Error>().is_some())
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
