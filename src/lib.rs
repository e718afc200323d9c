//! autoripper library - optical drive watching and automatic ripping.
//!
//! This library exposes the core of the `autoripper` daemon for use in
//! tests and other front ends.
//!
//! # Modules
//!
//! - `drive`: Drive status snapshots, media states and drive identity
//! - `events`: Hotplug events and the per-device attribute cache
//! - `reconcile`: Joins hotplug events to drive status
//! - `dispatch`: Video, audio and eject workflows
//! - `event_loop`: The single-threaded daemon loop
//! - `config`: Settings file handling
//! - `error`: Error types with operator hints
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod drive;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod logging;
pub mod reconcile;
