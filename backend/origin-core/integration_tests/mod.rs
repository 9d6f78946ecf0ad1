mod bridge;
mod interceptor;
mod server_tests;
