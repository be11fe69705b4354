pub mod ease;
pub mod smooth;
