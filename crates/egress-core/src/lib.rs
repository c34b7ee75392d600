pub mod audit;
pub mod auth;
pub mod chat;
pub mod consent;
pub mod context;
pub mod gateway;
pub mod prelude;
pub mod purpose;
pub mod telemetry;
