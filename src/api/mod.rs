pub mod attendance;
pub mod branch;
