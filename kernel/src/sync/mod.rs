//! 同步原语 (Synchronization Primitives)
//!
//! 阻塞式信号量的内核侧支撑：
//! - `semd` - 信号量标识与固定大小的描述符池
//! - `asl` - 活动信号量链表，把信号量映射到阻塞进程队列
//!
//! 核心概念：
//! - P 操作使计数为负时，陷阱处理层调用 `insert_blocked` 阻塞当前进程
//! - V 操作使计数非正时，调用 `remove_blocked` 唤醒最早阻塞的进程

pub mod asl;
pub mod semd;

pub use asl::{ActiveSemaphoreList, AslError, InsertStatus};
pub use semd::{SemKey, SemdPool, MAX_SEMD};
