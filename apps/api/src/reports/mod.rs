pub mod aggregator;
pub mod handlers;
pub mod priority;
pub mod scoring;
