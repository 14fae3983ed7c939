//! Portfolio pipeline service.

mod service;


pub use service::PortfolioService;
