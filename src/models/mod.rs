// Re-export all model types
pub use self::cart::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::menu::*;
pub use self::order::*;
pub use self::session::*;
pub use self::user::*;

mod cart;
mod enums;
mod errors;
mod menu;
mod order;
mod session;
mod user;
