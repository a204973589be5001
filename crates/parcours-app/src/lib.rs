// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod board;
pub mod cell;
pub mod detail;
pub mod editor;
pub mod filter;
pub mod format;
pub mod model;
pub mod pager;
pub mod state;
pub mod store;

pub use board::*;
pub use cell::*;
pub use detail::*;
pub use editor::*;
pub use filter::*;
pub use format::*;
pub use model::*;
pub use pager::*;
pub use state::*;
pub use store::*;
