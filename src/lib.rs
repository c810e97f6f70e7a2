//! Animated Gapminder-style dashboard: a wealth/health scatter plot, a
//! life-expectancy choropleth and a continent sunburst, all following one
//! shared year cursor.

pub mod app;
pub mod boundary;
pub mod broadcast;
pub mod config;
pub mod coordinator;
pub mod cursor;
pub mod data;
pub mod error;
pub mod hierarchy;
pub mod index;
pub mod interpolate;
pub mod loader;
pub mod map;
pub mod math;
pub mod scale;
pub mod scatter;
pub mod settings;
pub mod sunburst;
pub mod surface;
pub mod viewer;
