pub mod calendar;
pub mod task_store;
pub mod views;
