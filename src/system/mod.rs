pub mod collector;
pub mod platform;
pub mod provider;
pub mod reading;
pub mod sampler;
pub mod snapshot;
