pub mod aggregation;
pub mod bus;
pub mod canceller;
pub mod executor;
pub mod reducer;
pub mod resolver;
pub mod service;
pub mod strategy;
pub mod subscribers;
