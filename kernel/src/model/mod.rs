pub mod auth;
pub mod billing;
pub mod id;
pub mod lot;
pub mod pincode;
pub mod reservation;
pub mod role;
pub mod spot;
pub mod summary;
pub mod user;
pub mod vehicle;
