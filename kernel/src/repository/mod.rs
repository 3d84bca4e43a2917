pub mod auth;
pub mod health;
pub mod lot;
pub mod reservation;
pub mod spot;
pub mod user;
