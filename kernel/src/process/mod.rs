//! 进程管理模块
//!
//! 核心只需要进程的最小视图：
//! - `pcb`: 进程控制块与固定大小的 PCB 表
//! - `queue`: 侵入式 FIFO 进程队列（就绪队列、信号量等待队列）

pub mod pcb;
pub mod queue;

pub use pcb::{Pcb, PcbTable, Pid, ProcHandle};
pub use queue::ProcQueue;
