pub mod dedup;
pub mod pipeline;

pub use pipeline::{
    FulfillmentOutcome, FulfillmentPipeline, FulfillmentTarget, OutcomeState, PipelineConfig,
};
