//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-core`: 运行 vn-core 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `save-check`: 检查存档文件（格式、版本、资源引用）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use vn_core::{PersistentData, SaveData, collect_bundle_paths};
use walkdir::WalkDir;

/// 持久变量文件名（与 host-cli 的存档布局一致）
const PERSISTENT_FILE: &str = "persistent.json";

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    match cmd.status() {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "vn-core", "--html"]);
            run("cargo llvm-cov -p vn-core --html", &mut cov)?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // 排除 xtask，避免稀释信号
            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "--workspace", "--exclude", "xtask", "--html"]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "save-check" => {
            let saves_dir = args.next().map_or_else(|| PathBuf::from("saves"), PathBuf::from);
            let assets_root = args.next().map(PathBuf::from);
            save_check(&saves_dir, assets_root.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-core        运行 vn-core 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  save-check      检查存档文件

SAVE-CHECK:
  cargo xtask save-check [saves_dir] [assets_root]

  saves_dir 默认为 saves/
  指定 assets_root 时额外检查存档引用的资源文件是否存在

  检查内容：
    - JSON 格式与存档版本
    - persistent.json 格式与版本
    - 对象数据包中引用的资源文件
"#
    );
}

//=============================================================================
// save-check 命令实现
//=============================================================================

/// 存档检查结果
#[derive(Default)]
struct SaveCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 读取/解析错误
    errors: Vec<String>,
    /// 缺失的资源文件 (存档, 路径)
    missing_resources: Vec<(String, String)>,
}

fn save_check(saves_dir: &Path, assets_root: Option<&Path>) -> anyhow::Result<()> {
    if !saves_dir.is_dir() {
        anyhow::bail!("存档目录不存在: {}", saves_dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(saves_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    if files.is_empty() {
        eprintln!("未找到存档文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个存档文件...\n", files.len());

    let mut result = SaveCheckResult::default();
    for file in &files {
        check_save_file(file, assets_root, &mut result);
    }

    print_check_result(&result);

    if !result.errors.is_empty() {
        anyhow::bail!("存档检查发现错误");
    }
    Ok(())
}

fn check_save_file(file: &Path, assets_root: Option<&Path>, result: &mut SaveCheckResult) {
    let name = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            result.errors.push(format!("{}: 无法读取文件 - {}", name, e));
            return;
        }
    };

    let is_persistent = file
        .file_name()
        .is_some_and(|n| n == PERSISTENT_FILE);
    if is_persistent {
        if let Err(e) = PersistentData::from_json(&content) {
            result.errors.push(format!("{}: {}", name, e));
        }
        return;
    }

    let data = match SaveData::from_json(&content) {
        Ok(data) => data,
        Err(e) => {
            result.errors.push(format!("{}: {}", name, e));
            return;
        }
    };

    let Some(assets_root) = assets_root else {
        return;
    };
    for bundle in &data.objects {
        for path in collect_bundle_paths(bundle) {
            if !assets_root.join(&path).exists() {
                result.missing_resources.push((name.clone(), path));
            }
        }
    }
}

fn print_check_result(result: &SaveCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个文件", result.files_checked);
    eprintln!();

    for error in &result.errors {
        eprintln!("[ERROR] {}", error);
    }
    for (save, path) in &result.missing_resources {
        eprintln!("[WARN] {}: 资源不存在 {}", save, path);
    }

    let error_count = result.errors.len();
    let warn_count = result.missing_resources.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
