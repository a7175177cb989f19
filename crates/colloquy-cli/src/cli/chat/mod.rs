//! Interactive chat loop.

pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;

pub use loop_runner::run_chat_loop;
