// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod detail;
pub mod grid;
pub mod index;
pub mod model;
pub mod state;

pub use detail::*;
pub use grid::*;
pub use index::*;
pub use model::*;
pub use state::*;
