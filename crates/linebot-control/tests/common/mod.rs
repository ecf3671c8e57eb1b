//! 集成测试公共模块

#![allow(dead_code)]

pub mod mock_hardware;
