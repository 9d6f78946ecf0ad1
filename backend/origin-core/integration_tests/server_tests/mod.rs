pub mod helpers;
mod lifecycle;
mod protocol;
