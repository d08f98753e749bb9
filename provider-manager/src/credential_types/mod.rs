//! Concrete credential type implementations.

pub mod open_weather;
