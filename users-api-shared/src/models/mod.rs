pub mod user;

pub use user::{CreateUserRequest, Greeting, User, UserCreated};
