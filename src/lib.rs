pub mod analyser;
pub mod app;
pub mod audio;
pub mod config;
pub mod render;
pub mod scheduler;
pub mod surface;
pub mod terminal;
pub mod visual;
