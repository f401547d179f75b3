#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! HTTP service for creating and looking up users in PostgreSQL.

pub mod app_state;
pub mod db;
mod handlers;
pub mod http;
mod middleware;
mod routes;
pub mod server;
pub mod services;
mod tracer;
