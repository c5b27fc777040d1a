//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! 抢占式时间片轮转：
//! - 就绪队列 (ready queue): FIFO，队头先运行
//! - 时间片: 5ms，由本地定时器触发抢占
//! - 空闲处理: 停机 / 等待中断 / 死锁
//!
//! 调度入口: `Scheduler::dispatch_next()`

pub mod sched;

pub use sched::{Dispatch, Scheduler};

pub use crate::arch::copy_state;
