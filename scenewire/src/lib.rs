//! Application bootstrap for [scenewire_di] containers.
//!
//! Hosts usually want the same things before touching any scene: a logger, container policies
//! read from configuration, and a container reachable from anywhere in the main thread. This crate
//! provides such entrypoint in the form of [Application](application::Application), which
//! configures the supporting infrastructure, installs the [global](scenewire_di::global) container
//! and runs the first injection sweep over all loaded scenes.

pub mod application;
pub mod config;
