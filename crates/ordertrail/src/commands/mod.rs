pub mod generate;
pub mod input;
pub mod report;
pub mod summary;
pub mod timelines;
