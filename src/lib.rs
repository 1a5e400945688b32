pub mod app;
pub mod color;
pub mod data;
pub mod sample;
pub mod state;
pub mod ui;
