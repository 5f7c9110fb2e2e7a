pub mod draft;
pub mod models;
pub mod ports;
pub mod question;
pub mod services;
