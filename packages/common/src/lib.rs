pub mod filename;
pub mod gateway;
pub mod media;
pub mod pipeline;
pub mod request;
pub mod retry;
pub mod staging;

pub use gateway::{GatewayError, VisionGateway};
pub use media::MediaPart;
pub use pipeline::{AnalysisResult, LoadPolicy, PipelineError};
pub use request::AnalysisRequest;
pub use staging::{StagedFile, StagingError, StagingStore, UploadBatch};
