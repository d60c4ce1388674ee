pub mod change;
pub mod cursor;
pub mod file;
pub mod revision;
pub mod session;
