pub mod core;
pub mod layout;
pub mod render;
pub mod web;
