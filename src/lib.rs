// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod extensions;
pub mod names;
pub mod session;
pub mod types;
pub mod wait;

#[cfg(test)]
pub mod test_utils;
