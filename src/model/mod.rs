pub mod action;
pub mod attendance;
pub mod branch;
pub mod employee;
pub mod role;
pub mod user;
