mod api {
    pub mod handlers;
    pub mod params;
    pub mod rejection;
    pub mod routes;
}
mod authentication {
    pub mod cryptography;
    pub mod middleware;
}
mod database {
    pub mod actions;
    pub mod error;
    pub mod schema;
}
mod config;
mod media;

pub use api::rejection::handle_rejection;
pub use api::routes::routes;
pub use authentication::*;
pub use config::Config;
pub use database::*;
