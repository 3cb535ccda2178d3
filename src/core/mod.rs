// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod exception;
pub mod processor;
pub mod stream;
