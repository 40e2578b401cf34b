pub mod review;
pub mod sandbox;
