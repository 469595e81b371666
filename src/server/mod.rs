pub mod routes;
pub mod server;
pub mod static_files;
