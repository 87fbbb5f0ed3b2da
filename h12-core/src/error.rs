use thiserror::Error;

/// Why a component failed to come up.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("render failed: {0:#}")]
    Render(anyhow::Error),

    #[error("main failed: {0:#}")]
    Main(anyhow::Error),

    #[error("template generated by transform {found} cannot run on runtime {runtime}")]
    VersionMismatch { found: String, runtime: &'static str },

    #[error("component {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("component {0} has been destroyed")]
    Destroyed(String),
}
