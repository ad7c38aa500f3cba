//! Request handlers for user patterns received over NATS

mod user_requests;

pub use user_requests::UserRequestHandler;
