pub mod code;
pub mod model;
pub mod prelude;
pub mod proxy;
