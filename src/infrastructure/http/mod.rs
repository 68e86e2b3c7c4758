pub mod health_check;
pub mod reqwest_transport;

pub use health_check::HealthCheck;
pub use reqwest_transport::ReqwestTransport;
