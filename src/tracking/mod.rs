pub mod segment;
pub mod tracker;
