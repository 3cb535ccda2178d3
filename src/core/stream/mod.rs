// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod output;

pub use output::collector::{ChannelCollector, CollectingCollector, EventCollector, LogCollector};
