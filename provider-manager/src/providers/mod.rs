//! Concrete provider backend implementations.

pub mod open_weather;
