//! Handlers behind the static-file registration helpers.
//!
//! Directory routes are registered as `<relative>/*filepath`. The handler
//! opens `filepath` through a [`FileSystem`]; a file that cannot be opened
//! answers a bare 404, anything else is streamed back with a content type
//! derived from its extension.

use std::path::PathBuf;
use std::sync::Arc;

use draft_core::{handler_fn, Context, FileSystem, HandlerFunc};

use crate::error::{RegistrationError, RegistrationResult};

/// Name of the catch-all parameter used by directory routes.
pub const FILEPATH_PARAM: &str = "filepath";

/// Refuses static paths that would declare route parameters.
pub(crate) fn check_relative(relative: &str) -> RegistrationResult<()> {
    if relative.contains(':') || relative.contains('*') {
        return Err(RegistrationError::StaticPattern(relative.to_string()));
    }
    Ok(())
}

/// Builds the catch-all pattern for a directory route.
pub(crate) fn directory_pattern(relative: &str) -> String {
    format!("{}/*{FILEPATH_PARAM}", relative.trim_end_matches('/'))
}

pub(crate) fn file_system_handler(fs: Arc<dyn FileSystem>) -> HandlerFunc {
    handler_fn(move |c: &mut Context| {
        let Some(name) = c.param(FILEPATH_PARAM).map(str::to_owned) else {
            c.status(404);
            return;
        };
        match fs.open(&name) {
            Ok(reader) => c.serve_content(&name, reader),
            Err(e) => {
                tracing::debug!(file = %name, error = %e, "Static file not served");
                c.status(404);
            }
        }
    })
}

pub(crate) fn single_file_handler(path: PathBuf) -> HandlerFunc {
    handler_fn(move |c: &mut Context| c.file(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_relative() {
        assert!(check_relative("/assets").is_ok());
        assert!(check_relative("/").is_ok());
        assert!(matches!(
            check_relative("/assets/:id"),
            Err(RegistrationError::StaticPattern(_))
        ));
        assert!(check_relative("/assets/*rest").is_err());
    }

    #[test]
    fn test_directory_pattern() {
        assert_eq!(directory_pattern("/assets"), "/assets/*filepath");
        assert_eq!(directory_pattern("/assets/"), "/assets/*filepath");
        assert_eq!(directory_pattern("/"), "/*filepath");
        assert_eq!(directory_pattern(""), "/*filepath");
    }
}
