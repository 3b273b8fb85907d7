//! Database models split into domain-specific modules.

pub mod contact;
pub mod order;
pub mod product;
pub mod receipt;
pub mod user;

pub use contact::*;
pub use order::*;
pub use product::*;
pub use receipt::*;
pub use user::*;
