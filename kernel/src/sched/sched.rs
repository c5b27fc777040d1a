//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器实现
//!
//! 抢占式时间片轮转 (Round Robin)：
//! - 从就绪队列头取出下一个进程，记录开始时间，设置 5ms 本地定时器，装载其处理器状态
//! - 就绪队列为空时根据进程计数决定停机、空闲等待或死锁
//!
//! 调度上下文由 [`Scheduler`] 显式持有，在启动时构造一次；
//! 进程计数与软阻塞计数由 PCB / 中断处理层通过方法修改。

use log::{debug, error, info};

use crate::arch::{Machine, Status};
use crate::config::{IDLE_TIMER_US, TIME_SLICE_US};
use crate::errno::Errno;
use crate::process::{PcbTable, ProcHandle, ProcQueue};

/// 一次调度的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// 进程已装载到 CPU 上运行
    Running(ProcHandle),
    /// 没有就绪进程但有进程在等待 I/O，CPU 挂起等待中断
    IdleWait,
    /// 没有存活进程，正常停机
    Halted,
    /// 存活进程既不就绪也不等待 I/O：死锁，致命
    Panicked,
}

impl Dispatch {
    /// 停机与死锁之后不会再有调度
    pub fn is_terminal(self) -> bool {
        matches!(self, Dispatch::Halted | Dispatch::Panicked)
    }

    /// 致命结果对应的错误码
    pub fn errno(self) -> Option<Errno> {
        match self {
            Dispatch::Panicked => Some(Errno::ResourceDeadlock),
            _ => None,
        }
    }
}

/// 调度上下文
pub struct Scheduler {
    /// 当前运行的进程
    current: Option<ProcHandle>,
    /// 就绪队列
    ready: ProcQueue,
    /// 存活进程数
    process_count: usize,
    /// 等待 I/O（软阻塞）的进程数
    soft_block_count: usize,
    /// 当前进程被调度时的时钟
    start_tod: u64,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            current: None,
            ready: ProcQueue::new(),
            process_count: 0,
            soft_block_count: 0,
            start_tod: 0,
        }
    }

    /// 选择并运行下一个进程
    ///
    /// 在真实硬件上，`Running` 分支通过 `load_state` 交出控制权，之后只能经由
    /// 陷阱或中断重新进入内核；`IdleWait` 在中断到来前挂起 CPU。
    pub fn dispatch_next<const N: usize, M: Machine>(
        &mut self,
        pcbs: &mut PcbTable<N>,
        machine: &mut M,
    ) -> Dispatch {
        let Some(next) = self.ready.pop_front(pcbs) else {
            self.current = None;
            return self.idle(machine);
        };

        self.current = Some(next);
        self.start_tod = machine.tod();
        machine.set_timer(TIME_SLICE_US);

        debug!("sched: dispatch pid {} at {}", pcbs.get(next).pid(), self.start_tod);
        machine.load_state(&pcbs.get(next).state);
        Dispatch::Running(next)
    }

    /// 就绪队列为空时的处理
    fn idle<M: Machine>(&mut self, machine: &mut M) -> Dispatch {
        if self.process_count == 0 {
            info!("sched: no processes left, halting");
            machine.halt();
            return Dispatch::Halted;
        }

        if self.soft_block_count > 0 {
            debug!(
                "sched: idle, {} of {} processes waiting for I/O",
                self.soft_block_count, self.process_count
            );
            // 打开全局中断与全部中断线；兜底定时器保证即使没有设备中断也会重新进入内核
            machine.set_status(Status::IDLE_WAIT);
            machine.set_timer(IDLE_TIMER_US);
            machine.wait();
            return Dispatch::IdleWait;
        }

        error!(
            "sched: deadlock, {} processes alive, none ready, none waiting for I/O",
            self.process_count
        );
        machine.panic("deadlock: live processes but none ready or waiting for I/O");
        Dispatch::Panicked
    }

    /// 进程进入就绪队列尾部
    ///
    /// 进程已在某个队列中（例如仍阻塞在信号量上）时返回 `false`
    pub fn make_ready<const N: usize>(&mut self, pcbs: &mut PcbTable<N>, p: ProcHandle) -> bool {
        self.ready.push_back(pcbs, p)
    }

    /// 把自上次调度以来的时间计入当前进程，并重新开始计时
    ///
    /// 陷阱处理层在进入内核时调用
    pub fn charge_current<const N: usize>(&mut self, pcbs: &mut PcbTable<N>, now: u64) {
        if let Some(cur) = self.current {
            let elapsed = now.saturating_sub(self.start_tod);
            pcbs.get_mut(cur).cpu_time += elapsed;
        }
        self.start_tod = now;
    }

    /// 当前进程让出 CPU（阻塞或终止），不再计时
    pub fn clear_current(&mut self) -> Option<ProcHandle> {
        self.current.take()
    }

    pub fn process_created(&mut self) {
        self.process_count += 1;
    }

    pub fn process_exited(&mut self) {
        debug_assert!(self.process_count > 0, "process count underflow");
        self.process_count = self.process_count.saturating_sub(1);
    }

    /// 进程开始等待 I/O
    pub fn soft_block(&mut self) {
        self.soft_block_count += 1;
    }

    /// 等待 I/O 的进程被设备中断唤醒
    pub fn soft_unblock(&mut self) {
        debug_assert!(self.soft_block_count > 0, "soft block count underflow");
        self.soft_block_count = self.soft_block_count.saturating_sub(1);
    }

    #[inline]
    pub fn current(&self) -> Option<ProcHandle> {
        self.current
    }

    #[inline]
    pub fn process_count(&self) -> usize {
        self.process_count
    }

    #[inline]
    pub fn soft_block_count(&self) -> usize {
        self.soft_block_count
    }

    #[inline]
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    #[inline]
    pub fn ready_queue(&self) -> &ProcQueue {
        &self.ready
    }

    #[inline]
    pub fn start_tod(&self) -> u64 {
        self.start_tod
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::arch::ProcessorState;

    /// 硬件原语调用记录
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Event {
        Halt,
        Panic(String),
        Wait,
        LoadState(ProcessorState),
        SetStatus(Status),
        SetTimer(u32),
    }

    /// 记录调用的测试用 Machine
    #[derive(Default)]
    pub(crate) struct MockMachine {
        pub(crate) events: Vec<Event>,
        pub(crate) now: u64,
    }

    impl Machine for MockMachine {
        fn halt(&mut self) {
            self.events.push(Event::Halt);
        }

        fn panic(&mut self, msg: &str) {
            self.events.push(Event::Panic(msg.to_string()));
        }

        fn wait(&mut self) {
            self.events.push(Event::Wait);
        }

        fn load_state(&mut self, state: &ProcessorState) {
            self.events.push(Event::LoadState(*state));
        }

        fn set_status(&mut self, status: Status) {
            self.events.push(Event::SetStatus(status));
        }

        fn set_timer(&mut self, micros: u32) {
            self.events.push(Event::SetTimer(micros));
        }

        fn tod(&self) -> u64 {
            self.now
        }
    }

    fn spawn<const N: usize>(sched: &mut Scheduler, pcbs: &mut PcbTable<N>, pc: u32) -> ProcHandle {
        let p = pcbs.alloc().unwrap();
        pcbs.get_mut(p).state.pc = pc;
        sched.process_created();
        sched.make_ready(pcbs, p);
        p
    }

    #[test]
    fn test_dispatch_takes_ready_head() {
        let mut pcbs: PcbTable<4> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine { now: 1234, ..Default::default() };

        let a = spawn(&mut sched, &mut pcbs, 0x1000);
        let b = spawn(&mut sched, &mut pcbs, 0x2000);
        let c = spawn(&mut sched, &mut pcbs, 0x3000);

        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::Running(a));
        assert_eq!(sched.current(), Some(a));
        assert_eq!(sched.start_tod(), 1234);
        assert_eq!(sched.ready_queue().iter(&pcbs).collect::<Vec<_>>(), [b, c]);

        let state = pcbs.get(a).state;
        assert_eq!(
            machine.events,
            [Event::SetTimer(5000), Event::LoadState(state)]
        );
        assert_eq!(state.pc, 0x1000);
    }

    #[test]
    fn test_time_slice_is_five_ms() {
        assert_eq!(TIME_SLICE_US, 5000);
    }

    #[test]
    fn test_round_robin_rotation() {
        let mut pcbs: PcbTable<4> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine::default();

        let a = spawn(&mut sched, &mut pcbs, 0);
        let b = spawn(&mut sched, &mut pcbs, 0);

        let mut order = Vec::new();
        for _ in 0..4 {
            match sched.dispatch_next(&mut pcbs, &mut machine) {
                Dispatch::Running(p) => {
                    order.push(p);
                    // 时间片用完，重新排队
                    sched.make_ready(&mut pcbs, p);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(order, [a, b, a, b]);
    }

    #[test]
    fn test_empty_no_processes_halts() {
        let mut pcbs: PcbTable<2> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine::default();

        let outcome = sched.dispatch_next(&mut pcbs, &mut machine);
        assert_eq!(outcome, Dispatch::Halted);
        assert!(outcome.is_terminal());
        assert_eq!(machine.events, [Event::Halt]);
        assert_eq!(sched.current(), None);
    }

    #[test]
    fn test_empty_with_io_waiters_idles() {
        let mut pcbs: PcbTable<2> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine::default();
        sched.process_created();
        sched.process_created();
        sched.soft_block();

        let outcome = sched.dispatch_next(&mut pcbs, &mut machine);
        assert_eq!(outcome, Dispatch::IdleWait);
        assert!(!outcome.is_terminal());
        assert_eq!(
            machine.events,
            [
                Event::SetStatus(Status::IEC | Status::IM),
                Event::SetTimer(IDLE_TIMER_US),
                Event::Wait,
            ]
        );
        assert!(IDLE_TIMER_US > TIME_SLICE_US);
    }

    #[test]
    fn test_empty_without_io_waiters_panics() {
        let mut pcbs: PcbTable<2> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine::default();
        sched.process_created();
        sched.process_created();

        let outcome = sched.dispatch_next(&mut pcbs, &mut machine);
        assert_eq!(outcome, Dispatch::Panicked);
        assert!(outcome.is_terminal());
        assert_eq!(outcome.errno(), Some(Errno::ResourceDeadlock));
        assert_eq!(machine.events.len(), 1);
        assert!(matches!(&machine.events[0], Event::Panic(msg) if msg.contains("deadlock")));
    }

    #[test]
    fn test_idle_clears_current() {
        let mut pcbs: PcbTable<2> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine::default();

        let a = spawn(&mut sched, &mut pcbs, 0);
        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::Running(a));

        // a 阻塞等待 I/O
        sched.soft_block();
        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::IdleWait);
        assert_eq!(sched.current(), None);

        // 设备中断唤醒 a
        sched.soft_unblock();
        sched.make_ready(&mut pcbs, a);
        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::Running(a));

        // a 终止
        sched.clear_current();
        sched.process_exited();
        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::Halted);
    }

    #[test]
    fn test_make_ready_twice_keeps_rotation() {
        let mut pcbs: PcbTable<2> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine::default();

        let a = spawn(&mut sched, &mut pcbs, 0);
        let b = spawn(&mut sched, &mut pcbs, 0);
        assert!(!sched.make_ready(&mut pcbs, a));
        assert_eq!(sched.ready_len(), 2);

        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::Running(a));
        assert_eq!(sched.dispatch_next(&mut pcbs, &mut machine), Dispatch::Running(b));
        assert_eq!(sched.ready_len(), 0);
    }

    #[test]
    fn test_charge_current() {
        let mut pcbs: PcbTable<2> = PcbTable::new();
        let mut sched = Scheduler::new();
        let mut machine = MockMachine { now: 100, ..Default::default() };

        let a = spawn(&mut sched, &mut pcbs, 0);
        sched.dispatch_next(&mut pcbs, &mut machine);

        sched.charge_current(&mut pcbs, 4100);
        assert_eq!(pcbs.get(a).cpu_time, 4000);
        assert_eq!(sched.start_tod(), 4100);

        sched.charge_current(&mut pcbs, 5000);
        assert_eq!(pcbs.get(a).cpu_time, 4900);

        // 没有当前进程时只重置计时起点
        sched.clear_current();
        sched.charge_current(&mut pcbs, 9000);
        assert_eq!(pcbs.get(a).cpu_time, 4900);
        assert_eq!(sched.start_tod(), 9000);
    }

    #[test]
    fn test_counters() {
        let mut sched = Scheduler::default();
        sched.process_created();
        sched.process_created();
        sched.soft_block();
        assert_eq!(sched.process_count(), 2);
        assert_eq!(sched.soft_block_count(), 1);

        sched.soft_unblock();
        sched.process_exited();
        assert_eq!(sched.process_count(), 1);
        assert_eq!(sched.soft_block_count(), 0);
        assert_eq!(sched.ready_len(), 0);
    }
}
