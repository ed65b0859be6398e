pub mod auth;
pub mod edge;

pub use auth::{auth_middleware, Authenticated};
pub use edge::edge_middleware;
