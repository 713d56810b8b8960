//! # Session Context
//!
//! Resolves the optional session id once at startup.
//!
//! Sources, first non-blank wins:
//! 1. explicit value (command line)
//! 2. persisted state file
//! 3. value embedded in the configuration

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::SessionConfig;

/// Where the session id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    CommandLine,
    StateFile,
    Config,
}

/// Immutable session context for one poller run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    id: Option<String>,
    source: Option<SessionSource>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn read_state_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => non_blank(Some(contents.as_str())),
        Err(e) => {
            // A missing file just means no persisted session
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Cannot read session state file {}: {}", path.display(), e);
            }
            None
        }
    }
}

impl SessionContext {
    /// Context with no session
    pub fn none() -> Self {
        Self::default()
    }

    /// Context with a fixed id
    pub fn with_id(id: impl Into<String>) -> Self {
        let id: String = id.into();
        let id = non_blank(Some(id.as_str()));
        let source = id.as_ref().map(|_| SessionSource::CommandLine);
        Self { id, source }
    }

    /// Resolve the session id from all configured sources.
    pub fn resolve(explicit: Option<&str>, config: &SessionConfig) -> Self {
        let candidates = [
            (SessionSource::CommandLine, non_blank(explicit)),
            (
                SessionSource::StateFile,
                config.state_file.as_deref().and_then(|p| read_state_file(Path::new(p))),
            ),
            (SessionSource::Config, non_blank(config.id.as_deref())),
        ];

        for (source, id) in candidates {
            if let Some(id) = id {
                debug!("Session {} resolved from {:?}", id, source);
                return Self {
                    id: Some(id),
                    source: Some(source),
                };
            }
        }

        debug!("No session id configured");
        Self::none()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn source(&self) -> Option<SessionSource> {
        self.source
    }

    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn state_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_no_sources() {
        let ctx = SessionContext::resolve(None, &SessionConfig::default());
        assert!(!ctx.is_present());
        assert_eq!(ctx.id(), None);
        assert_eq!(ctx.source(), None);
    }

    #[test]
    fn test_command_line_wins() {
        let file = state_file("from-file");
        let config = SessionConfig {
            id: Some("from-config".to_string()),
            state_file: Some(file.path().to_string_lossy().into_owned()),
        };

        let ctx = SessionContext::resolve(Some("from-cli"), &config);
        assert_eq!(ctx.id(), Some("from-cli"));
        assert_eq!(ctx.source(), Some(SessionSource::CommandLine));
    }

    #[test]
    fn test_state_file_before_config() {
        let file = state_file("  from-file\n");
        let config = SessionConfig {
            id: Some("from-config".to_string()),
            state_file: Some(file.path().to_string_lossy().into_owned()),
        };

        let ctx = SessionContext::resolve(None, &config);
        assert_eq!(ctx.id(), Some("from-file"));
        assert_eq!(ctx.source(), Some(SessionSource::StateFile));
    }

    #[test]
    fn test_config_fallback() {
        let config = SessionConfig {
            id: Some("from-config".to_string()),
            state_file: Some("/nonexistent/session-id".to_string()),
        };

        let ctx = SessionContext::resolve(None, &config);
        assert_eq!(ctx.id(), Some("from-config"));
        assert_eq!(ctx.source(), Some(SessionSource::Config));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let file = state_file("   \n");
        let config = SessionConfig {
            id: Some("  ".to_string()),
            state_file: Some(file.path().to_string_lossy().into_owned()),
        };

        let ctx = SessionContext::resolve(Some(""), &config);
        assert!(!ctx.is_present());
    }

    #[test]
    fn test_with_id() {
        assert_eq!(SessionContext::with_id("abc").id(), Some("abc"));
        assert!(!SessionContext::with_id(" ").is_present());
    }
}
