pub mod account;
pub mod admin;
pub mod evaluation;
pub mod lessons;
pub mod progress;
