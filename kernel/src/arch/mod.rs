//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 架构相关代码
//!
//! 核心只通过 [`Machine`] 这一窄接口接触硬件：
//! - 停机 / 致命错误
//! - 等待中断
//! - 装载处理器状态并恢复执行
//! - 设置状态寄存器、本地定时器
//! - 读取时钟
//!
//! 具体平台（或测试替身）实现该 trait。

pub mod context;

pub use context::{copy_state, ProcessorState, Status};

/// 平台原语
///
/// 在真实硬件上 `halt`、`panic`、`load_state` 不会返回，`wait` 在任意中断到来前挂起 CPU。
/// 宿主环境下这些方法正常返回，调度器把结果以 [`crate::sched::Dispatch`] 交还给调用者，
/// 由中断回调驱动的调度循环继续执行。
pub trait Machine {
    /// 正常停机
    fn halt(&mut self);

    /// 致命错误，打印诊断信息后停机
    fn panic(&mut self, msg: &str);

    /// 挂起 CPU 直到任意中断到来
    fn wait(&mut self);

    /// 装载处理器状态并把控制权交给该状态
    fn load_state(&mut self, state: &ProcessorState);

    /// 写状态寄存器
    fn set_status(&mut self, status: Status);

    /// 设置处理器本地定时器 (微秒)
    fn set_timer(&mut self, micros: u32);

    /// 读取时钟 (微秒)
    fn tod(&self) -> u64;
}
