pub mod mapper;
pub mod path;
