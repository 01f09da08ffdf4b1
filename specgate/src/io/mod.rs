//! I/O helpers for gate commands.

pub mod config;
pub mod evidence;
pub mod hook;
pub mod markers;
pub mod paths;
pub mod process;
pub mod spec_dir;
