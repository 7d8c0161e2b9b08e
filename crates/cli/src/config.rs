//! Engine location settings shared by every subcommand.
//!
//! Flags win over environment variables, which win over defaults.

use std::path::PathBuf;

/// Environment variable naming the engine executable.
pub const ENGINE_ENV: &str = "MARCBENCH_ENGINE";

/// Environment variable naming the engine service base URL.
pub const SERVER_ENV: &str = "MARCBENCH_SERVER";

const DEFAULT_ENGINE: &str = "marclite";

/// Resolved engine location for one invocation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable to spawn for local runs.
    pub engine: PathBuf,
    /// Engine service base URL. When set, jobs go over HTTP.
    pub server: Option<String>,
}

impl EngineConfig {
    /// Resolves the configuration from command line flags and the
    /// process environment.
    pub fn resolve(engine_flag: Option<PathBuf>, server_flag: Option<String>) -> Self {
        Self::from_sources(
            engine_flag,
            server_flag,
            std::env::var_os(ENGINE_ENV).map(PathBuf::from),
            std::env::var(SERVER_ENV).ok(),
        )
    }

    fn from_sources(
        engine_flag: Option<PathBuf>,
        server_flag: Option<String>,
        engine_env: Option<PathBuf>,
        server_env: Option<String>,
    ) -> Self {
        Self {
            engine: engine_flag
                .or(engine_env)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE)),
            server: server_flag.or(server_env),
        }
    }
}
