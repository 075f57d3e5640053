pub mod healthcheck;
pub mod location;
pub mod subscription;
