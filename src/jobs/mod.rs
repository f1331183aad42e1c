pub mod models;
pub mod scanner;

pub use models::{JobRequest, JobType};
pub use scanner::JobScanner;
