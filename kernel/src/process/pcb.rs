//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程控制块 (Process Control Block)
//!
//! 所有 PCB 存放在启动时确定大小的固定数组中，不做任何动态分配：
//! - 空闲槽位由显式的下标栈管理
//! - 进程以 [`ProcHandle`]（槽位下标）被引用
//! - 队列链接嵌入 PCB 内部（侵入式），因此一个进程同一时刻只能位于一个队列

use log::warn;

use crate::arch::ProcessorState;
use crate::config::MAX_PROC;
use crate::sync::SemKey;

/// 进程标识符
pub type Pid = u32;

/// 进程句柄
///
/// PCB 表中的槽位下标，只由 [`PcbTable::alloc`] 产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcHandle(u16);

impl ProcHandle {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// 侵入式队列链接，由 `process::queue` 维护
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueLink {
    pub(crate) next: Option<ProcHandle>,
    pub(crate) prev: Option<ProcHandle>,
    /// 是否已位于某个队列中
    pub(crate) queued: bool,
}

impl QueueLink {
    pub(crate) const UNLINKED: QueueLink = QueueLink {
        next: None,
        prev: None,
        queued: false,
    };
}

/// 进程控制块
#[derive(Debug, Clone, Copy)]
pub struct Pcb {
    pid: Pid,
    in_use: bool,
    /// 被打断时保存的处理器状态
    pub state: ProcessorState,
    /// 累计占用的 CPU 时间 (微秒)
    pub cpu_time: u64,
    /// 当前阻塞所在的信号量，只由 ASL 读写
    blocked_on: Option<SemKey>,
    pub(crate) link: QueueLink,
}

impl Pcb {
    const EMPTY: Pcb = Pcb {
        pid: 0,
        in_use: false,
        state: ProcessorState::ZERO,
        cpu_time: 0,
        blocked_on: None,
        link: QueueLink::UNLINKED,
    };

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// 进程当前阻塞的信号量；未阻塞时为 `None`
    #[inline]
    pub fn blocked_on(&self) -> Option<SemKey> {
        self.blocked_on
    }

    #[inline]
    pub(crate) fn set_blocked_on(&mut self, key: Option<SemKey>) {
        self.blocked_on = key;
    }

    /// 是否位于某个进程队列（就绪队列或信号量等待队列）
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.link.queued
    }
}

/// PCB 表
///
/// 容量 `N` 默认为配置的最大进程数
pub struct PcbTable<const N: usize = MAX_PROC> {
    pcbs: [Pcb; N],
    /// 空闲槽位下标栈
    free: [u16; N],
    free_len: usize,
    next_pid: Pid,
}

impl<const N: usize> PcbTable<N> {
    const CAPACITY_OK: () = assert!(N > 0 && N <= u16::MAX as usize, "PCB 表容量超出 u16 编号范围");

    /// 初始化 PCB 表，所有槽位进入空闲栈
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;

        let mut free = [0u16; N];
        // 栈顶为 0 号槽位，分配顺序与下标一致
        for (slot, index) in free.iter_mut().zip((0..N).rev()) {
            *slot = index as u16;
        }

        Self {
            pcbs: [Pcb::EMPTY; N],
            free,
            free_len: N,
            next_pid: 1,
        }
    }

    /// 分配一个 PCB
    ///
    /// 返回的 PCB 状态清零、未阻塞、不在任何队列中；表满时返回 `None`
    pub fn alloc(&mut self) -> Option<ProcHandle> {
        if self.free_len == 0 {
            return None;
        }
        self.free_len -= 1;
        let handle = ProcHandle(self.free[self.free_len]);

        let pid = self.next_pid;
        self.next_pid = self.next_pid.wrapping_add(1).max(1);

        let pcb = &mut self.pcbs[handle.index()];
        *pcb = Pcb::EMPTY;
        pcb.pid = pid;
        pcb.in_use = true;

        Some(handle)
    }

    /// 归还一个 PCB
    ///
    /// 调用者必须先把进程从所有队列中移出
    pub fn free(&mut self, p: ProcHandle) {
        let pcb = &mut self.pcbs[p.index()];
        if !pcb.in_use {
            warn!("pcb: double free of slot {}", p.index());
            return;
        }
        debug_assert!(!pcb.link.queued, "freeing a queued PCB");
        debug_assert!(pcb.blocked_on.is_none(), "freeing a blocked PCB");

        pcb.in_use = false;
        self.free[self.free_len] = p.0;
        self.free_len += 1;
    }

    #[inline]
    pub fn get(&self, p: ProcHandle) -> &Pcb {
        debug_assert!(self.pcbs[p.index()].in_use, "stale process handle");
        &self.pcbs[p.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, p: ProcHandle) -> &mut Pcb {
        debug_assert!(self.pcbs[p.index()].in_use, "stale process handle");
        &mut self.pcbs[p.index()]
    }

    /// 已分配的 PCB 数量
    pub fn allocated(&self) -> usize {
        N - self.free_len
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for PcbTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
