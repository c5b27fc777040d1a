//! Nucleus 内核构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml（或 build/.config）配置文件
//! 2. 校验进程与调度参数
//! 3. 生成 src/config.rs

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// 默认最大进程数
const DEFAULT_MAX_PROC: i64 = 20;
/// 默认时间片 (5ms)
const DEFAULT_TIME_SLICE_US: i64 = 5000;
/// 默认空闲兜底定时器
const DEFAULT_IDLE_TIMER_US: i64 = 0xFFFF_FFFF;

/// 解析 build/.config 文件（简单 key=value 格式）
///
/// `scheduler_time_slice_us=5000` 会被放入 `[scheduler]` 的 `time_slice_us`
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, HashMap<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // 跳过注释和空行
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        // 使用第一个下划线分割 section 和 key
        let Some((section, config_key)) = key.trim().split_once('_') else {
            continue;
        };

        let parsed_value = if value == "true" {
            toml::Value::Boolean(true)
        } else if value == "false" {
            toml::Value::Boolean(false)
        } else if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else {
            toml::Value::String(value.trim_matches('"').to_string())
        };

        sections
            .entry(section.to_string())
            .or_default()
            .insert(config_key.to_string(), parsed_value);
    }

    let mut root_map = toml::map::Map::new();
    for (section_name, section_data) in sections {
        let table: toml::map::Map<String, toml::Value> = section_data.into_iter().collect();
        root_map.insert(section_name, toml::Value::Table(table));
    }

    toml::Value::Table(root_map)
}

fn get_str<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn get_int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");

    // 优先读取 build/.config（menuconfig 生成的配置），其次 Kernel.toml
    let config = if let Ok(content) = fs::read_to_string("../build/.config") {
        println!("cargo:warning=Using build/.config configuration");
        parse_dot_config(&content)
    } else if let Ok(content) = fs::read_to_string("../Kernel.toml") {
        toml::from_str(&content).expect("Kernel.toml 解析失败")
    } else {
        println!("cargo:warning=Kernel.toml not found, using built-in defaults");
        toml::Value::Table(toml::map::Map::new())
    };

    let max_proc = get_int(&config, "process", "max_proc", DEFAULT_MAX_PROC);
    // ProcHandle 与描述符槽位都以 u16 编号
    assert!(
        (1..=u16::MAX as i64 - 2).contains(&max_proc),
        "process.max_proc 超出范围: {}",
        max_proc
    );

    let time_slice_us = get_int(&config, "scheduler", "time_slice_us", DEFAULT_TIME_SLICE_US);
    let idle_timer_us = get_int(&config, "scheduler", "idle_timer_us", DEFAULT_IDLE_TIMER_US);
    for (name, value) in [("time_slice_us", time_slice_us), ("idle_timer_us", idle_timer_us)] {
        assert!(
            (1..=u32::MAX as i64).contains(&value),
            "scheduler.{} 超出范围: {}",
            name,
            value
        );
    }

    let kernel_name = get_str(&config, "general", "name", "Nucleus");
    let kernel_version = get_str(&config, "general", "version", "0.1.0");

    let config_source = format!(
        r#"//! Nucleus 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{}";

// ============================================================
// 进程配置
// ============================================================

/// 最大并发进程数
pub const MAX_PROC: usize = {};

// ============================================================
// 调度器配置
// ============================================================

/// 时间片长度 (微秒)
pub const TIME_SLICE_US: u32 = {};

/// 空闲等待兜底定时器 (微秒)
pub const IDLE_TIMER_US: u32 = {};
"#,
        kernel_name, kernel_version, max_proc, time_slice_us, idle_timer_us,
    );

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR 未设置"));
    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_source {
        fs::write(&config_file, &config_source).expect("写入配置文件失败");
    }
}
