pub mod error;
pub mod generator;
pub mod writer;

pub use error::{Result, SynthError};
pub use generator::{generate, DelayScenario, GeneratedEvent, GeneratorConfig};
pub use writer::{write_csv, write_events, write_jsonl};
