pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod routes;
pub mod state;
pub mod ws_handler;

#[cfg(test)]
mod test_support;

// Re-export the WebSocket handler and router builder for the binaries.
pub use routes::build_router;
pub use ws_handler::ws_handler;
