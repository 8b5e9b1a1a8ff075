pub mod clock;
pub mod export;
pub mod reports;
pub mod tracker;
