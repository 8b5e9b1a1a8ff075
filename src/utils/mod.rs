pub mod employee_cache;
pub mod key_lock;
