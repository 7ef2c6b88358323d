use godot::prelude::*;

pub mod balance;
pub mod build_item;
pub mod config;
pub mod descriptor;
pub mod efficiency;
pub mod error;
pub mod ids;
pub mod launch_complex;
pub mod launch_pad;
pub mod migration;
pub mod operations;
pub mod persistence;
pub mod space_center;
pub mod strategy;
pub mod telemetry;
pub mod workforce;

mod space_center_node;

struct LaunchComplexExtension;

#[gdextension]
unsafe impl ExtensionLibrary for LaunchComplexExtension {}
