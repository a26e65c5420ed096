//! Permission gate and built-in role templates.

mod authorize;
mod roles;

pub use authorize::authorize;
pub use roles::RoleTemplate;
