pub mod check;
pub mod config;
pub mod gallery;
pub mod run;
