pub mod bechdel;
pub mod cli;
pub mod config;
pub mod imdb;
pub mod json;
pub mod logging;
pub mod oscars;
pub mod pipeline;
pub mod stage;
pub mod utils;
