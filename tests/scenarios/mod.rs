//! # Small problems with known outcomes
//!
//! Each problem is solved from the all logical basis and the reported iterate is checked against
//! values computed by hand.
#[allow(missing_docs)]
mod test;
