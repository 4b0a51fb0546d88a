//! Request handlers. Each submodule serves one resource and maps errors via
//! [`AppError`](crate::error::AppError).

pub mod jobs;
