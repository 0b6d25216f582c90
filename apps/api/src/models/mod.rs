pub mod history;
pub mod tailoring;
