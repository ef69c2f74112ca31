pub mod auth;
pub mod catalog;
pub mod company;
pub mod dashboard;
pub mod order;
