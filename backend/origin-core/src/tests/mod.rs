mod bridge;
mod interceptor;
mod support;
