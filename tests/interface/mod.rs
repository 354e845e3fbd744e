//! # Parameters, limits and warm starts
#[allow(missing_docs)]
mod test;
