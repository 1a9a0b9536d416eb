pub mod handlers;
pub mod middleware;
pub mod orbits;
pub mod routes;

pub use routes::create_router;
