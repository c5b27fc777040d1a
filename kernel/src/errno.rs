//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 内核错误代码定义
//!
//! 数值与 include/uapi/asm-generic/errno.h 保持一致，
//! 供陷阱处理层把 ASL / 调度器的错误转换为系统调用返回值

/// 标准错误代码
///
/// 使用方法：
/// ```rust
/// use nucleus::errno::Errno;
///
/// // 系统调用风格，返回负数
/// assert_eq!(Errno::NoSpace.as_neg_i32(), -28);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,

    /// No space left (ENOSPC, 28)
    NoSpace = 28,

    /// Resource deadlock would occur (EDEADLK, 35)
    ResourceDeadlock = 35,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于系统调用返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_values() {
        assert_eq!(Errno::InvalidArgument.as_i32(), 22);
        assert_eq!(Errno::NoSpace.as_i32(), 28);
        assert_eq!(Errno::ResourceDeadlock.as_i32(), 35);
    }

    #[test]
    fn test_errno_negative() {
        assert_eq!(Errno::NoSpace.as_neg_i32(), -28);
        assert_eq!(Errno::InvalidArgument.as_neg_i32(), -22);
    }
}
