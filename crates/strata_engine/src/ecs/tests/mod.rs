//! Frame loop integration tests
//!
//! Exercise whole ticks through the scene manager: hook ordering, mutation
//! from inside hooks, draw ordering and teardown.
