pub mod auth;
pub mod lot;
pub mod reservation;
pub mod spot;
pub mod user;
