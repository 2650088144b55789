pub mod health;
pub mod points;
pub mod session;
pub mod users;
pub mod validation;
