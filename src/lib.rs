pub mod climate;
pub mod commands;
pub mod number;
pub mod output;
pub mod points;
pub mod snapshot;
pub mod translate;
