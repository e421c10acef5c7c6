pub mod pipeline_desc;
pub mod probe;

pub use pipeline_desc::{CullerDesc, DecoderDesc, PipelineDesc};
pub use probe::ProbeConfig;
