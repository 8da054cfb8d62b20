pub mod dashboard;
pub mod frames;
pub mod kyc;
pub mod player;
