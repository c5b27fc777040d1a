//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 活动信号量链表 (Active Semaphore List, ASL)
//!
//! 把信号量标识映射到阻塞在其上的进程队列：
//! - 链表按键严格升序，无重复键
//! - 头尾各有一个哨兵（最小键 / 最大键），扫描无需判空即可终止
//! - 每个非哨兵描述符的等待队列都非空；队列一旦清空，描述符立即归还描述符池
//!
//! 陷阱处理层在 P/V 操作、等待设备、强制终止等场景调用这里的接口。

use core::fmt;

use log::{debug, warn};

use super::semd::{SemKey, SemdPool, SlotId, MAX_SEMD};
use crate::errno::Errno;
use crate::process::{PcbTable, ProcHandle, ProcQueue};

/// `insert_blocked` 的正常结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    /// 进程已进入信号量的等待队列
    Blocked,
    /// 没有给出进程，什么都没做
    NotInserted,
}

/// ASL 错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AslError {
    /// 描述符池耗尽
    ///
    /// 池容量与最大进程数一一对应，出现即说明内核其他部分的进程计数有误，
    /// 调用者应按致命错误处理
    ResourceExhausted,
    /// 键与哨兵键相同
    ReservedKey,
    /// 进程已经阻塞，或仍位于就绪队列等其他队列中
    AlreadyQueued,
}

impl fmt::Display for AslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AslError::ResourceExhausted => write!(f, "semaphore descriptor pool exhausted"),
            AslError::ReservedKey => write!(f, "semaphore key is reserved for a sentinel"),
            AslError::AlreadyQueued => write!(f, "process is already on a queue"),
        }
    }
}

impl From<AslError> for Errno {
    fn from(err: AslError) -> Self {
        match err {
            AslError::ResourceExhausted => Errno::NoSpace,
            AslError::ReservedKey | AslError::AlreadyQueued => Errno::InvalidArgument,
        }
    }
}

/// 活动信号量链表
pub struct ActiveSemaphoreList<const N: usize = MAX_SEMD> {
    pool: SemdPool<N>,
}

impl<const N: usize> ActiveSemaphoreList<N> {
    /// 初始化 ASL：建立描述符池并链接两个哨兵
    pub fn new() -> Self {
        Self {
            pool: SemdPool::new(),
        }
    }

    /// 从头哨兵开始查找第一个键 >= `key` 的描述符
    ///
    /// 返回 (前驱, 当前)。尾哨兵的键是最大值，循环必然终止。
    fn search(&self, key: SemKey) -> (SlotId, SlotId) {
        let mut prev = SlotId::HEAD;
        let mut cur = self.pool.get(prev).next;
        while self.pool.get(cur).key < key {
            prev = cur;
            cur = self.pool.get(cur).next;
        }

        #[cfg(feature = "debug_log")]
        log::trace!("asl: search {:#x} -> prev={:?} cur={:?}", key.raw(), prev, cur);

        (prev, cur)
    }

    /// 查找键完全匹配的活动描述符
    fn find(&self, key: SemKey) -> Option<(SlotId, SlotId)> {
        let (prev, cur) = self.search(key);
        if cur == SlotId::TAIL || self.pool.get(cur).key != key {
            return None;
        }
        Some((prev, cur))
    }

    /// 等待队列清空的描述符从链表摘下并归还描述符池
    fn reclaim_if_drained(&mut self, prev: SlotId, cur: SlotId) {
        if !self.pool.get(cur).queue.is_empty() {
            return;
        }
        let next = self.pool.get(cur).next;
        self.pool.get_mut(prev).next = next;
        self.pool.release(cur);
    }

    /// 把进程 `p` 阻塞到信号量 `key` 上
    ///
    /// # 返回
    /// - `Ok(Blocked)` - 进程已排入等待队列尾部，其阻塞键已设置
    /// - `Ok(NotInserted)` - `p` 为 `None`，无操作
    /// - `Err(ResourceExhausted)` - 需要新描述符但池已耗尽，状态不变
    /// - `Err(ReservedKey)` - `key` 是哨兵键，状态不变
    /// - `Err(AlreadyQueued)` - `p` 已阻塞或仍在其他队列中，状态不变
    pub fn insert_blocked<const P: usize>(
        &mut self,
        key: SemKey,
        p: Option<ProcHandle>,
        pcbs: &mut PcbTable<P>,
    ) -> Result<InsertStatus, AslError> {
        let Some(p) = p else {
            return Ok(InsertStatus::NotInserted);
        };
        if key.is_sentinel() {
            return Err(AslError::ReservedKey);
        }
        if pcbs.get(p).is_queued() || pcbs.get(p).blocked_on().is_some() {
            warn!(
                "asl: pid {} is already queued, refusing to block it on {:#x}",
                pcbs.get(p).pid(),
                key.raw()
            );
            return Err(AslError::AlreadyQueued);
        }

        let (prev, cur) = self.search(key);
        if self.pool.get(cur).key == key {
            self.pool.get_mut(cur).queue.push_back(pcbs, p);
        } else {
            let Some(slot) = self.pool.alloc() else {
                warn!(
                    "asl: descriptor pool exhausted blocking pid {} on {:#x}",
                    pcbs.get(p).pid(),
                    key.raw()
                );
                return Err(AslError::ResourceExhausted);
            };

            let semd = self.pool.get_mut(slot);
            semd.key = key;
            semd.queue = ProcQueue::new();
            semd.queue.push_back(pcbs, p);
            semd.next = cur;
            self.pool.get_mut(prev).next = slot;
        }

        pcbs.get_mut(p).set_blocked_on(Some(key));
        debug!("asl: pid {} blocked on {:#x}", pcbs.get(p).pid(), key.raw());
        Ok(InsertStatus::Blocked)
    }

    /// 唤醒阻塞在 `key` 上最早的进程
    ///
    /// 没有该键的活动描述符时返回 `None`
    pub fn remove_blocked<const P: usize>(
        &mut self,
        key: SemKey,
        pcbs: &mut PcbTable<P>,
    ) -> Option<ProcHandle> {
        let (prev, cur) = self.find(key)?;

        let p = self.pool.get_mut(cur).queue.pop_front(pcbs)?;
        pcbs.get_mut(p).set_blocked_on(None);
        self.reclaim_if_drained(prev, cur);

        debug!("asl: pid {} woken from {:#x}", pcbs.get(p).pid(), key.raw());
        Some(p)
    }

    /// 把 `p` 从它所阻塞的信号量等待队列中移出，不论其在队列中的位置
    ///
    /// 通过进程自身记录的阻塞键定位描述符。进程未阻塞时返回 `None`。
    pub fn out_blocked<const P: usize>(
        &mut self,
        p: ProcHandle,
        pcbs: &mut PcbTable<P>,
    ) -> Option<ProcHandle> {
        let key = pcbs.get(p).blocked_on()?;

        let Some((prev, cur)) = self.find(key) else {
            warn!("asl: pid {} records {:#x} but no such semaphore is active", pcbs.get(p).pid(), key.raw());
            return None;
        };
        if self.pool.get_mut(cur).queue.remove(pcbs, p).is_none() {
            warn!("asl: pid {} is not queued on {:#x}", pcbs.get(p).pid(), key.raw());
            return None;
        }

        pcbs.get_mut(p).set_blocked_on(None);
        self.reclaim_if_drained(prev, cur);

        debug!("asl: pid {} pulled out of {:#x}", pcbs.get(p).pid(), key.raw());
        Some(p)
    }

    /// 阻塞在 `key` 上最早的进程，不修改任何状态
    pub fn head_blocked(&self, key: SemKey) -> Option<ProcHandle> {
        let (_, cur) = self.find(key)?;
        self.pool.get(cur).queue.head()
    }

    /// 阻塞在 `key` 上的进程数
    pub fn waiters(&self, key: SemKey) -> usize {
        self.find(key)
            .map_or(0, |(_, cur)| self.pool.get(cur).queue.len())
    }

    /// 活动描述符数量（不含哨兵）
    pub fn active(&self) -> usize {
        self.keys().count() - 2
    }

    /// 空闲描述符数量
    pub fn free_descriptors(&self) -> usize {
        self.pool.available()
    }

    /// 按链表顺序遍历所有键，含首尾哨兵
    pub fn keys(&self) -> Keys<'_, N> {
        Keys {
            pool: &self.pool,
            cur: SlotId::HEAD,
        }
    }
}

impl<const N: usize> Default for ActiveSemaphoreList<N> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Keys<'a, const N: usize> {
    pool: &'a SemdPool<N>,
    cur: SlotId,
}

impl<const N: usize> Iterator for Keys<'_, N> {
    type Item = SemKey;

    fn next(&mut self) -> Option<SemKey> {
        if self.cur == SlotId::NIL {
            return None;
        }
        let semd = self.pool.get(self.cur);
        self.cur = semd.next;
        Some(semd.key)
    }
}
