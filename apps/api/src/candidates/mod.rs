pub mod handlers;
pub mod records;
