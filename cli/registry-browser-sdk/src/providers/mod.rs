pub mod registry;
pub mod storage;

#[cfg(any(test, feature = "tests"))]
pub mod mock;
