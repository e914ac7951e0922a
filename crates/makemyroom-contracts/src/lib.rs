//! Network-free state for the room redesign studio: images, history,
//! comparison slider, style catalog, chat session and the `Studio` container
//! that ties them together.

pub mod chat;
pub mod config;
pub mod events;
pub mod images;
pub mod studio;
pub mod styles;
