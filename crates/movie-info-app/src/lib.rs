pub mod error;
pub mod movie_info;
pub mod service;
pub mod state;
