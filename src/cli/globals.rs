use std::path::PathBuf;

use crate::config::AuthConfig;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub store: PathBuf,
    pub json: bool,
    pub config: AuthConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(store: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            json: false,
            config: AuthConfig::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new("/tmp/classgate.json");
        assert_eq!(args.store, PathBuf::from("/tmp/classgate.json"));
        assert!(!args.json);
        assert_eq!(args.config.max_attempts(), 5);
    }
}
