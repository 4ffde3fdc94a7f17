pub mod admin;
pub mod application;
pub mod event;
pub mod models;
pub mod ports;
pub mod tokener;
