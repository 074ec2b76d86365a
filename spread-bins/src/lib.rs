//! Shared setup code for the workspace's process entry points.

pub mod common;
