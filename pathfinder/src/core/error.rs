// world_pathfinder/pathfinder/src/core/error.rs
use thiserror::Error;

/// Failure of a path or spawn query. A partial path is not an error; see `PathOutcome::Partial`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Structural data missing: {0}")]
    StructuralMissing(String),

    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),

    #[error("Search exhausted: {0}")]
    SearchExhausted(String),
}

impl PathError {
    /// Stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PathError::InvalidInput(_) => "invalid_input",
            PathError::StructuralMissing(_) => "structural_missing",
            PathError::UnsupportedTopology(_) => "unsupported_topology",
            PathError::SearchExhausted(_) => "search_exhausted",
        }
    }
}

pub type PathResult<T> = Result<T, PathError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavMeshError {
    #[error("Navigation mesh has no polygons")]
    Empty,

    #[error("Polygon {poly} references missing vertex {index}")]
    InvalidVertexIndex { poly: usize, index: u32 },

    #[error("Polygon {poly} has {count} vertices (expected 3..={max})")]
    BadVertexCount { poly: usize, count: usize, max: usize },

    #[error("Polygon {0} has zero area")]
    DegeneratePolygon(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Floor {floor}: triangle {triangle} references missing vertex {index}")]
    InvalidTriangle { floor: u32, triangle: usize, index: u32 },

    #[error("Floor {floor}: triangle {triangle} has zero area")]
    DegenerateTriangle { floor: u32, triangle: usize },

    #[error("Floor {floor}: edge references missing node {node}")]
    InvalidEdge { floor: u32, node: u32 },

    #[error("Floor {floor}: node id {node} used more than once")]
    DuplicateNode { floor: u32, node: u32 },

    #[error("Floor {0} defined more than once")]
    DuplicateFloor(u32),

    #[error("Layout '{0}' has no exterior floor (cell 0)")]
    MissingExteriorFloor(String),
}

#[derive(Error, Debug)]
pub enum WorldDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Navigation mesh error in region '{region}': {source}")]
    NavMesh { region: String, source: NavMeshError },

    #[error("Portal layout error in template '{template}': {source}")]
    Layout { template: String, source: LayoutError },

    #[error("Invalid world data: {0}")]
    InvalidData(String),
}

pub type WorldResult<T> = Result<T, WorldDataError>;
