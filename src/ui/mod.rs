pub mod event;
pub mod products;
pub mod transcript;
