use nalgebra::{Point3, Vector3};
use std::fmt;
use std::path::PathBuf;

/// Why a single parameter group was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProblem {
    pub name: &'static str,
    /// Required number of values; `None` for groups taking any number.
    pub expected: Option<usize>,
    /// Number of values given, `None` when the group is absent.
    pub found: Option<usize>,
}

impl fmt::Display for GroupProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.expected, self.found) {
            (_, None) => write!(f, "-{} is missing", self.name),
            (Some(expected), Some(found)) => write!(
                f,
                "-{} takes {} value(s), got {}",
                self.name, expected, found
            ),
            (None, Some(found)) => write!(f, "-{} got {} value(s)", self.name, found),
        }
    }
}

/// Errors raised while turning arguments into a scene configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid parameters: {}", join_problems(.0))]
    InvalidGroups(Vec<GroupProblem>),

    #[error("cannot read config file {path:?}: {source}")]
    Overlay {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path:?}: {message}")]
    OverlayParse { path: PathBuf, message: String },
}

fn join_problems(problems: &[GroupProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that abort a render.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("image size {width}x{height} has no pixels")]
    EmptyViewport { width: u32, height: u32 },

    #[error("cannot build a camera frame from eye {eye:?}, center {center:?}, up {up:?}")]
    DegenerateCamera {
        eye: Point3<f64>,
        center: Point3<f64>,
        up: Vector3<f64>,
    },

    #[error("failed to load model {path:?}: {message}")]
    Model { path: PathBuf, message: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
