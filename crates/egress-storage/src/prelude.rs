pub use crate::errors::StorageError;
pub use crate::memory::{MemoryConsentStore, MemoryContextStore, MemoryDirectory};
pub use crate::model::{ConsentRecord, ContextRecord, Organization};
pub use crate::pool::{StorePool, Stores};
pub use crate::spi::{ConsentStore, ContextStore, OrgDirectory};
