// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod filter;
pub mod gesture;
pub mod ids;
pub mod messages;
pub mod model;
pub mod provider;
pub mod state;

pub use filter::*;
pub use gesture::*;
pub use ids::*;
pub use messages::*;
pub use model::*;
pub use provider::*;
pub use state::*;
