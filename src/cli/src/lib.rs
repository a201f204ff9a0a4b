//! wft-runner CLI - launches workflow tests and shells in containers.

pub mod commands;
