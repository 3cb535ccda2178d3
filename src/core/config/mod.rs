// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod element_config;

pub use element_config::{FlatConfig, PropertySource};
