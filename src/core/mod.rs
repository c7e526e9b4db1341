//! Business logic: staging, codec, scanner, tracker and pipelines

pub mod codec;
pub mod pipeline;
pub mod scanner;
pub mod staging;
pub mod tracker;
