pub mod identity;
pub mod request_id;

pub use identity::{IdentityCookie, IdentityLayer};
pub use request_id::{RequestId, RequestIdMiddleware};
