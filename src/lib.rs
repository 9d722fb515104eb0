pub mod models;
pub mod pipeline;
pub mod processing;
pub mod prompts;
pub mod report;
pub mod services;
pub mod utils;
pub mod validation;

pub use pipeline::StudentProcessor;
