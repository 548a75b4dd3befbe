// ABOUTME: Helper modules for the nutriscan CLI
// ABOUTME: Output formatting shared by every command
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutriscan Contributors

pub mod display;
