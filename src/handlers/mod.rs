// src/handlers/mod.rs
pub mod generate;
pub mod jobs;
pub mod status;
