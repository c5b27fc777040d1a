//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Nucleus 内核核心
//!
//! 单处理器教学内核的两块基础设施：
//! - 活动信号量链表 (`sync::asl`): 信号量到阻塞进程队列的映射
//! - 轮转调度器 (`sched`): 5ms 时间片，空闲时停机 / 等待中断 / 死锁
//!
//! 硬件原语通过 [`arch::Machine`] 注入，核心本身不依赖具体平台，
//! 也不做任何动态分配。

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod errno;
pub mod init;
pub mod process;
pub mod sched;
pub mod sync;

pub use arch::{copy_state, Machine, ProcessorState};
pub use init::Nucleus;
pub use sched::{Dispatch, Scheduler};
pub use sync::{ActiveSemaphoreList, SemKey};
