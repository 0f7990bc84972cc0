// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed clients for the Rancher API surfaces

pub mod base;
pub mod catalog;
pub mod management;
pub mod rancher;
pub mod steve;
