//! Outline helpers and UFO export

pub mod outline;
pub mod ufo;
