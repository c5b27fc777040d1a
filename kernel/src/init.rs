//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内核启动初始化
//!
//! 把 PCB 表、活动信号量链表和调度上下文打包为一个值，在启动时构造一次：
//! - `initPcbs`: 所有 PCB 进入空闲栈
//! - `initASL`: 描述符池建立，哨兵链接完成
//! - 调度器: 就绪队列为空，进程计数与软阻塞计数清零
//!
//! 之后所有内核路径都以 `&mut Nucleus` 访问核心状态，不存在全局可变量。

use log::info;

use crate::config::{KERNEL_NAME, KERNEL_VERSION, MAX_PROC};
use crate::process::PcbTable;
use crate::sched::Scheduler;
use crate::sync::{ActiveSemaphoreList, MAX_SEMD};

/// 核心状态
pub struct Nucleus {
    pub pcbs: PcbTable,
    pub asl: ActiveSemaphoreList,
    pub sched: Scheduler,
}

impl Nucleus {
    /// 启动时的唯一初始化入口
    pub fn new() -> Self {
        info!(
            "{} v{}: {} PCBs, {} semaphore descriptors",
            KERNEL_NAME, KERNEL_VERSION, MAX_PROC, MAX_SEMD
        );
        Self {
            pcbs: PcbTable::new(),
            asl: ActiveSemaphoreList::new(),
            sched: Scheduler::new(),
        }
    }
}

impl Default for Nucleus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::copy_state;
    use crate::sched::sched::tests::{Event, MockMachine};
    use crate::sched::Dispatch;
    use crate::sync::{InsertStatus, SemKey};

    #[test]
    fn test_boot_state() {
        let n = Nucleus::new();
        assert_eq!(n.pcbs.allocated(), 0);
        assert_eq!(n.pcbs.capacity(), MAX_PROC);
        assert_eq!(n.asl.active(), 0);
        assert_eq!(n.asl.free_descriptors(), MAX_PROC);
        assert_eq!(n.sched.process_count(), 0);
        assert_eq!(n.sched.ready_len(), 0);
        assert!(n.sched.current().is_none());
    }

    #[test]
    fn test_block_wake_dispatch() {
        let mut n = Nucleus::new();
        let mut machine = MockMachine::default();
        let sem = 0i32;
        let key = SemKey::of(&sem);

        let a = n.pcbs.alloc().unwrap();
        let b = n.pcbs.alloc().unwrap();
        n.pcbs.get_mut(b).state.pc = 0x8000;
        n.sched.process_created();
        n.sched.process_created();
        n.sched.make_ready(&mut n.pcbs, a);

        // A 运行后在 P 操作上阻塞，B 在信号量上等待
        assert_eq!(n.sched.dispatch_next(&mut n.pcbs, &mut machine), Dispatch::Running(a));
        assert_eq!(n.asl.insert_blocked(key, Some(b), &mut n.pcbs), Ok(InsertStatus::Blocked));
        assert_eq!(n.sched.clear_current(), Some(a));
        assert_eq!(n.asl.insert_blocked(key, Some(a), &mut n.pcbs), Ok(InsertStatus::Blocked));

        // 无就绪进程也无 I/O 等待：死锁
        machine.events.clear();
        assert_eq!(n.sched.dispatch_next(&mut n.pcbs, &mut machine), Dispatch::Panicked);

        // V 操作唤醒最早阻塞的 B
        let woken = n.asl.remove_blocked(key, &mut n.pcbs).unwrap();
        assert_eq!(woken, b);
        assert!(n.pcbs.get(b).blocked_on().is_none());
        n.sched.make_ready(&mut n.pcbs, woken);

        machine.events.clear();
        assert_eq!(n.sched.dispatch_next(&mut n.pcbs, &mut machine), Dispatch::Running(b));
        assert_eq!(machine.events.last(), Some(&Event::LoadState(n.pcbs.get(b).state)));
        assert_eq!(n.asl.head_blocked(key), Some(a));
        assert_eq!(n.asl.active(), 1);
    }

    #[test]
    fn test_terminate_blocked_process() {
        let mut n = Nucleus::new();
        let mut machine = MockMachine::default();
        let key = SemKey::new(0x4000);

        let p = n.pcbs.alloc().unwrap();
        n.sched.process_created();
        n.asl.insert_blocked(key, Some(p), &mut n.pcbs).unwrap();

        assert_eq!(n.asl.out_blocked(p, &mut n.pcbs), Some(p));
        assert_eq!(n.asl.active(), 0);
        n.pcbs.free(p);
        n.sched.process_exited();

        assert_eq!(n.sched.dispatch_next(&mut n.pcbs, &mut machine), Dispatch::Halted);
        assert_eq!(machine.events, [Event::Halt]);
    }

    #[test]
    fn test_save_and_restore_state() {
        let mut n = Nucleus::new();
        let mut machine = MockMachine::default();
        let p = n.pcbs.alloc().unwrap();
        n.sched.process_created();

        // 陷阱进入时保存的状态拷贝进 PCB
        let mut trapped = n.pcbs.get(p).state;
        trapped.pc = 0x2000_0100;
        trapped.reg[5] = 0xdead_beef;
        copy_state(&trapped, &mut n.pcbs.get_mut(p).state);

        n.sched.make_ready(&mut n.pcbs, p);
        n.sched.dispatch_next(&mut n.pcbs, &mut machine);
        assert_eq!(machine.events.last(), Some(&Event::LoadState(trapped)));
    }
}
