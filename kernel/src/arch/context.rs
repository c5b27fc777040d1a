//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 处理器状态 (Processor State)
//!
//! 进程被打断时由陷阱处理层保存、被调度时由 `Machine::load_state` 恢复的寄存器集合：
//! - 31 个通用寄存器 (at, v0-v1, a0-a3, t0-t9, s0-s7, gp, sp, fp, ra, HI, LO)
//! - 4 个控制寄存器 (EntryHi, Cause, Status, PC)

use bitflags::bitflags;

/// 通用寄存器数量
pub const STATE_REG_NUM: usize = 31;

bitflags! {
    /// 处理器状态寄存器 (Status) 位定义
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// 当前全局中断使能 (IEc)
        const IEC = 1 << 0;
        /// 当前内核/用户模式 (KUc)
        const KUC = 1 << 1;
        /// 上一个全局中断使能 (IEp)
        const IEP = 1 << 2;
        /// 上一个内核/用户模式 (KUp)
        const KUP = 1 << 3;
        /// 更早的全局中断使能 (IEo)
        const IEO = 1 << 4;
        /// 更早的内核/用户模式 (KUo)
        const KUO = 1 << 5;
        /// 中断屏蔽位 IM[7:0]，全部打开
        const IM = 0x0000_FF00;
        /// 处理器本地定时器使能 (TE)
        const TE = 1 << 27;
    }
}

impl Status {
    /// 空闲等待时装入的状态：
    /// 清空所有位，再打开全局中断与全部外部中断线
    pub const IDLE_WAIT: Status = Status::IEC.union(Status::IM);
}

/// 处理器状态
///
/// 寄存器内容对内核而言是不透明的，这里只负责保存与搬运
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorState {
    /// TLB EntryHi（含 ASID）
    pub entry_hi: u32,
    /// 异常原因寄存器
    pub cause: u32,
    /// 状态寄存器
    pub status: u32,
    /// 程序计数器
    pub pc: u32,
    /// 通用寄存器
    pub reg: [u32; STATE_REG_NUM],
}

impl ProcessorState {
    /// 全零状态
    pub const ZERO: ProcessorState = ProcessorState {
        entry_hi: 0,
        cause: 0,
        status: 0,
        pc: 0,
        reg: [0; STATE_REG_NUM],
    };

    /// 以类型化的方式读取状态寄存器，未定义位被丢弃
    #[inline]
    pub fn status_flags(&self) -> Status {
        Status::from_bits_truncate(self.status)
    }

    #[inline]
    pub fn set_status_flags(&mut self, status: Status) {
        self.status = status.bits();
    }
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self::ZERO
    }
}

/// 复制处理器状态
///
/// 无条件地把 `src` 的全部通用寄存器和控制寄存器复制到 `dst`，
/// 不做任何内容校验
pub fn copy_state(src: &ProcessorState, dst: &mut ProcessorState) {
    dst.reg.copy_from_slice(&src.reg);

    dst.pc = src.pc;
    dst.cause = src.cause;
    dst.entry_hi = src.entry_hi;
    dst.status = src.status;
}
