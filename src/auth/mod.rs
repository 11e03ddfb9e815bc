//! Sessions, password hashing, and the access-control gate.

pub mod gate;
pub mod password;
pub mod session;
