//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 信号量描述符池 (Semaphore Descriptor Pool)
//!
//! 固定大小的描述符数组加一个显式的空闲下标栈：
//! - 容量 = 最大进程数 + 2
//! - 0、1 号槽位永久保留为哨兵（最小键 / 最大键），从不进入空闲栈
//! - 其余槽位在首次阻塞某个新键时分配，等待队列清空时归还
//!
//! 描述符之间通过槽位下标链接，不使用裸指针。

use log::warn;

use crate::config::MAX_PROC;
use crate::process::ProcQueue;

/// 描述符池默认容量
pub const MAX_SEMD: usize = MAX_PROC + 2;

/// 信号量标识
///
/// 不透明、全序的身份值，只做比较，从不解引用。
/// 通常取信号量变量的地址（见 [`SemKey::of`]）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemKey(usize);

impl SemKey {
    /// 头哨兵使用的键
    pub const MIN: SemKey = SemKey(usize::MIN);
    /// 尾哨兵使用的键
    pub const MAX: SemKey = SemKey(usize::MAX);

    #[inline]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// 以变量地址作为信号量标识
    #[inline]
    pub fn of<T>(sem: &T) -> Self {
        Self(sem as *const T as usize)
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// 是否为哨兵保留的键
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.0 == usize::MIN || self.0 == usize::MAX
    }
}

/// 描述符槽位下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotId(u16);

impl SlotId {
    /// 头哨兵
    pub(crate) const HEAD: SlotId = SlotId(0);
    /// 尾哨兵
    pub(crate) const TAIL: SlotId = SlotId(1);
    /// 空链接，只出现在尾哨兵和空闲槽位上
    pub(crate) const NIL: SlotId = SlotId(u16::MAX);

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn is_sentinel(self) -> bool {
        self.0 == Self::HEAD.0 || self.0 == Self::TAIL.0
    }
}

/// 信号量描述符
#[derive(Debug)]
pub(crate) struct SemDescriptor {
    pub(crate) key: SemKey,
    /// 阻塞在该信号量上的进程
    pub(crate) queue: ProcQueue,
    /// 按键升序的下一个描述符
    pub(crate) next: SlotId,
}

impl SemDescriptor {
    const fn new(key: SemKey, next: SlotId) -> Self {
        Self {
            key,
            queue: ProcQueue::new(),
            next,
        }
    }

    /// 恢复为未使用的空闲槽位
    fn reset(&mut self) {
        self.key = SemKey::MIN;
        self.queue = ProcQueue::new();
        self.next = SlotId::NIL;
    }
}

/// 描述符池
pub struct SemdPool<const N: usize = MAX_SEMD> {
    slots: [SemDescriptor; N],
    free: [u16; N],
    free_len: usize,
}

impl<const N: usize> SemdPool<N> {
    const CAPACITY_OK: () = assert!(
        N >= 2 && N < u16::MAX as usize,
        "描述符池至少需要两个哨兵槽位"
    );

    /// 初始化描述符池
    ///
    /// 划出两个哨兵并链接为 头 -> 尾，其余槽位全部进入空闲栈
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;

        let slots = core::array::from_fn(|index| match index {
            0 => SemDescriptor::new(SemKey::MIN, SlotId::TAIL),
            1 => SemDescriptor::new(SemKey::MAX, SlotId::NIL),
            _ => SemDescriptor::new(SemKey::MIN, SlotId::NIL),
        });

        let mut free = [0u16; N];
        let mut free_len = 0;
        // 栈顶为 2 号槽位
        for index in (2..N).rev() {
            free[free_len] = index as u16;
            free_len += 1;
        }

        Self {
            slots,
            free,
            free_len,
        }
    }

    /// 取出一个空闲描述符；池耗尽时返回 `None`
    pub(crate) fn alloc(&mut self) -> Option<SlotId> {
        if self.free_len == 0 {
            return None;
        }
        self.free_len -= 1;
        Some(SlotId(self.free[self.free_len]))
    }

    /// 把描述符压回空闲栈
    pub(crate) fn release(&mut self, slot: SlotId) {
        debug_assert!(!slot.is_sentinel(), "sentinel descriptors are never released");
        if slot.is_sentinel() {
            warn!("semd: refusing to release sentinel slot {}", slot.index());
            return;
        }
        debug_assert!(self.slots[slot.index()].queue.is_empty());

        self.slots[slot.index()].reset();
        self.free[self.free_len] = slot.0;
        self.free_len += 1;
    }

    #[inline]
    pub(crate) fn get(&self, slot: SlotId) -> &SemDescriptor {
        &self.slots[slot.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, slot: SlotId) -> &mut SemDescriptor {
        &mut self.slots[slot.index()]
    }

    /// 空闲描述符数量
    pub fn available(&self) -> usize {
        self.free_len
    }

    /// 总槽位数（含两个哨兵）
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SemdPool<N> {
    fn default() -> Self {
        Self::new()
    }
}
