use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlotError {
    #[error("invalid grid resolution {nu}x{nv}: both directions need at least 2 segments")]
    InvalidGridResolution { nu: usize, nv: usize },
    #[error("unknown surface family '{0}'")]
    UnknownSurfaceFamily(String),
    #[error("unknown colormap '{0}'")]
    UnknownColormap(String),
    #[error("{resource} needs {requested} elements but only {capacity} were allocated")]
    CapacityExceeded {
        resource: &'static str,
        requested: usize,
        capacity: usize,
    },
    #[error("failed to create device resource '{label}': {reason}")]
    DeviceResourceCreationFailed { label: String, reason: String },
}

impl PlotError {
    /// Errors after which the current session can keep rendering the previous mesh.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PlotError::DeviceResourceCreationFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;
