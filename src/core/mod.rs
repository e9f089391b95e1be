// Copyright 2026 Mount Converge Developers
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod controller;
pub mod executor;
pub mod planner;
pub mod state;

pub use controller::MountController;
pub use planner::{Action, ActionPlan, Decision};
pub use state::CurrentState;
