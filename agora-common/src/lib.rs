//! Domain model shared by the store layer and the API.

pub mod model;
pub mod util;
