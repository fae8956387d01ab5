mod claims;
pub mod extractors;
pub mod guards;
pub mod password;
pub mod session;
