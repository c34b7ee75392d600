pub mod errors;
pub mod memory;
pub mod model;
pub mod pool;
pub mod prelude;

pub mod spi {
    pub mod consent;
    pub mod context;
    pub mod directory;

    pub use self::consent::*;
    pub use self::context::*;
    pub use self::directory::*;
}

pub use errors::StorageError;
pub use model::*;
pub use spi::*;
