pub mod handlers;
pub mod routes;
pub mod titles;

pub use routes::create_router;
