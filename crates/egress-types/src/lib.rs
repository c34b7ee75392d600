pub mod audit;
pub mod message;
pub mod org;
pub mod prelude;
pub mod session;
pub mod telemetry;
pub mod time;
