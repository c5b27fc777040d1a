//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程队列 (FIFO)
//!
//! 侵入式双向链表：链接字段嵌入 PCB，队列本身只记录头、尾和长度。
//! 用途：
//! - 调度器的就绪队列
//! - 每个活动信号量描述符的等待队列
//!
//! 所有修改操作都显式借用 [`PcbTable`]，链接始终只有一个写者。

use log::warn;

use super::pcb::{PcbTable, ProcHandle, QueueLink};

/// 队列只是链表的头尾句柄，不可复制，否则副本会与 PCB 中的链接脱节
#[derive(Debug, PartialEq, Eq, Default)]
pub struct ProcQueue {
    head: Option<ProcHandle>,
    tail: Option<ProcHandle>,
    len: usize,
}

impl ProcQueue {
    /// 创建空队列
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 队首进程，不出队
    #[inline]
    pub fn head(&self) -> Option<ProcHandle> {
        self.head
    }

    /// 追加到队尾
    ///
    /// 进程已位于某个队列时拒绝入队并返回 `false`，原有链接保持不变
    pub fn push_back<const N: usize>(&mut self, pcbs: &mut PcbTable<N>, p: ProcHandle) -> bool {
        if pcbs.get(p).link.queued {
            warn!("queue: pid {} is already queued", pcbs.get(p).pid());
            return false;
        }

        pcbs.get_mut(p).link = QueueLink {
            next: None,
            prev: self.tail,
            queued: true,
        };

        match self.tail {
            Some(tail) => pcbs.get_mut(tail).link.next = Some(p),
            None => self.head = Some(p),
        }
        self.tail = Some(p);
        self.len += 1;
        true
    }

    /// 移出队首进程；空队列返回 `None`
    pub fn pop_front<const N: usize>(&mut self, pcbs: &mut PcbTable<N>) -> Option<ProcHandle> {
        let head = self.head?;
        self.unlink(pcbs, head);
        Some(head)
    }

    /// 把 `p` 从队列的任意位置移出；`p` 不在本队列时返回 `None`
    pub fn remove<const N: usize>(
        &mut self,
        pcbs: &mut PcbTable<N>,
        p: ProcHandle,
    ) -> Option<ProcHandle> {
        if !self.contains(pcbs, p) {
            return None;
        }
        self.unlink(pcbs, p);
        Some(p)
    }

    pub fn contains<const N: usize>(&self, pcbs: &PcbTable<N>, p: ProcHandle) -> bool {
        self.iter(pcbs).any(|q| q == p)
    }

    /// 从队首到队尾遍历
    pub fn iter<'a, const N: usize>(&self, pcbs: &'a PcbTable<N>) -> Iter<'a, N> {
        Iter {
            pcbs,
            cur: self.head,
            remaining: self.len,
        }
    }

    fn unlink<const N: usize>(&mut self, pcbs: &mut PcbTable<N>, p: ProcHandle) {
        let QueueLink { next, prev, .. } = pcbs.get(p).link;

        match prev {
            Some(prev) => pcbs.get_mut(prev).link.next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => pcbs.get_mut(next).link.prev = prev,
            None => self.tail = prev,
        }

        pcbs.get_mut(p).link = QueueLink::UNLINKED;
        self.len -= 1;
    }
}

pub struct Iter<'a, const N: usize> {
    pcbs: &'a PcbTable<N>,
    cur: Option<ProcHandle>,
    remaining: usize,
}

impl<const N: usize> Iterator for Iter<'_, N> {
    type Item = ProcHandle;

    fn next(&mut self) -> Option<ProcHandle> {
        // remaining 限定步数，链接损坏时也不会无限循环
        if self.remaining == 0 {
            return None;
        }
        let cur = self.cur?;
        self.remaining -= 1;
        self.cur = self.pcbs.get(cur).link.next;
        Some(cur)
    }
}
