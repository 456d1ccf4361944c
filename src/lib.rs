pub mod app;
pub mod backdrop;
pub mod card;
pub mod color;
pub mod config;
pub mod countdown;
pub mod effects;
pub mod envelope;
pub mod guestbook;
pub mod logging;
pub mod particle;
pub mod scheduler;
pub mod screen;
pub mod surface;
