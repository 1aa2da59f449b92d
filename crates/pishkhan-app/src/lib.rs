// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod carousel;
pub mod error;
pub mod filter;
pub mod forms;
pub mod ids;
pub mod list;
pub mod model;
pub mod mutation;
pub mod pagination;
pub mod sizing;
pub mod source;
pub mod state;
pub mod viewport;

pub use carousel::*;
pub use error::*;
pub use filter::*;
pub use forms::*;
pub use ids::*;
pub use list::*;
pub use model::*;
pub use mutation::*;
pub use pagination::*;
pub use sizing::*;
pub use source::*;
pub use state::*;
pub use viewport::*;
