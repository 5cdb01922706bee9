pub mod access_log;
pub mod cors;

pub use access_log::access_log;
pub use cors::{AllowHeaders, with_cors};
