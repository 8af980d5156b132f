mod rpc;
mod sort;
mod user;

pub use rpc::*;
pub use sort::*;
pub use user::*;

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
