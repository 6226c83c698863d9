// Copyright 2026 NANDO Registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! NANDO registry library — disease taxonomy curation and patient-support
//! organization discovery.
//!
//! This library crate exposes the core modules for integration testing.

#![allow(dead_code, unused_imports, clippy::new_without_default)]

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod llm;
pub mod registry;
pub mod rest;
pub mod tabular;
pub mod taxonomy;
