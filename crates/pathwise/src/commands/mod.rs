//! Command implementations that go beyond a single analysis call.

pub mod init;
