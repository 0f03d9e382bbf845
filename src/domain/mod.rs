// Domain layer - Plain data types shared by the pipeline
pub mod dashboard;
pub mod entity;
pub mod routing;
pub mod session;
pub mod telemetry;
