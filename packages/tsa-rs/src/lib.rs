pub mod align;
pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod mmap_utils;
pub mod operations;
pub mod parser;
pub mod peaks;
pub mod profiling;
pub mod registry;
pub mod regression;
pub mod source;
pub mod statistics;
pub mod types;

pub use chart::ChartPayload;
pub use client::DataApiClient;
pub use config::{ConfigError, DataApiConfig};
pub use error::{AnalysisError, Result};
pub use operations::{AnalysisFacade, Monotonicity};
pub use peaks::{PeakDetection, PeakDetector, PeakFlag};
pub use registry::{list_operations, prescription, OperationSpec, Prescription, OPERATION_REGISTRY};
pub use source::{FileSource, InMemorySource, SeriesSource};
pub use types::*;
