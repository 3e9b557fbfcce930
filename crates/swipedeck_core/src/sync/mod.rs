//! Change propagation between execution contexts sharing one backend.

pub mod storage_bus;
