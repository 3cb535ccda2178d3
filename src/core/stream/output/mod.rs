// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod collector;
pub mod sink;

pub use collector::EventCollector;
