pub mod change;
pub mod cursor;
pub mod file;
pub mod revision;

pub use change::*;
pub use cursor::*;
pub use file::*;
pub use revision::*;
