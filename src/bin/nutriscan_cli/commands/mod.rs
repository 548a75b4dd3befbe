// ABOUTME: Command modules for the nutriscan CLI
// ABOUTME: One module per subcommand: lookup, batch, providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

pub mod batch;
pub mod lookup;
pub mod providers;
