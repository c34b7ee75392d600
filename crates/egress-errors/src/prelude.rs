pub use crate::code::{codes, ErrorCode, RetryClass, Severity};
pub use crate::model::{ErrorBuilder, ErrorObj, PublicErrorView};
pub use crate::proxy::ProxyError;
