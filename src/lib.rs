pub mod app;
pub mod catalog;
pub mod data;
pub mod flags;
pub mod model;
pub mod result;
pub mod selection;
pub mod tournament;
pub mod ui;
