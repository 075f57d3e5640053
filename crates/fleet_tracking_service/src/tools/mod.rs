pub mod callapi;
pub mod error;
pub mod logger;
pub mod prometheus;
