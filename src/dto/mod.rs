pub mod auth;
pub mod cart;
pub mod history;
pub mod orders;
pub mod products;
pub mod profile;
