pub mod download;
pub mod liveness;
pub mod process;
pub mod readiness;
