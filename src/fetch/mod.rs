pub mod fetcher;
pub mod polling;
pub mod service;
pub mod transport;
