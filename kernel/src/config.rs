//! Nucleus 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "Nucleus";

/// 内核版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// 进程配置
// ============================================================

/// 最大并发进程数
pub const MAX_PROC: usize = 20;

// ============================================================
// 调度器配置
// ============================================================

/// 时间片长度 (微秒)
pub const TIME_SLICE_US: u32 = 5000;

/// 空闲等待兜底定时器 (微秒)
pub const IDLE_TIMER_US: u32 = 4294967295;
