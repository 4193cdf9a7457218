//! Catalog data model

pub mod laptop;
pub mod user;

pub use laptop::{
    Cpu, Filter, Gpu, Keyboard, KeyboardLayout, Laptop, Memory, MemoryUnit, Panel, Resolution,
    Screen, Storage, StorageDriver, Weight,
};
pub use user::UserAccount;
