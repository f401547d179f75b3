#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! Models and configuration shared by the users-api server and its tests.

pub mod config;
pub mod models;
