pub mod booking;
pub mod court;
pub mod slot;
pub mod time;
pub mod user;

pub use booking::*;
pub use court::*;
pub use slot::*;
pub use time::*;
pub use user::*;
