//! Visual Novel Engine - 无界面宿主
//!
//! 加载配置与持久变量，运行示例场景若干帧，并读写存档。

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use host_cli::demo::{RecordingLoader, build_demo_scene, demo_factory};
use host_cli::{HostConfig, SaveManager};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vn_core::{PersistentData, SceneDirector, VariableRef, preload};

#[derive(Parser)]
#[command(name = "host-cli", about = "VN core 无界面宿主")]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 覆盖存档目录
    #[arg(long)]
    saves_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 开始新游戏并运行若干帧
    Run {
        /// 覆盖运行帧数
        #[arg(long)]
        frames: Option<u32>,
        /// 从该槽位读档后继续运行
        #[arg(long)]
        load: Option<u32>,
        /// 结束后保存到该槽位
        #[arg(long)]
        save: Option<u32>,
        /// 示例消息文本
        #[arg(long, default_value = "欢迎来到视觉小说引擎。")]
        text: String,
    },
    /// 列出所有存档
    ListSaves,
    /// 打印存档内容
    InspectSave { slot: u32 },
    /// 删除存档
    DeleteSave { slot: u32 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, fallback) = HostConfig::load_or_default(&cli.config);
    init_tracing(&config.log_level);
    match fallback {
        Some(reason) => warn!(path = ?cli.config, "{reason}"),
        None => info!(path = ?cli.config, "配置文件加载成功"),
    }

    if let Some(dir) = cli.saves_dir {
        config.saves_dir = dir;
    }
    config.validate().context("配置无效")?;
    let saves = SaveManager::new(&config.saves_dir);

    match cli.command {
        Command::Run {
            frames,
            load,
            save,
            text,
        } => run(&config, &saves, frames.unwrap_or(config.frames), load, save, &text),
        Command::ListSaves => {
            for (slot, _) in saves.list_saves() {
                match saves.get_save_info(slot) {
                    Some(info) => println!(
                        "#{:03}  {}  scene={}  objects={}",
                        info.slot,
                        info.timestamp,
                        info.scene.as_deref().unwrap_or("-"),
                        info.objects
                    ),
                    None => println!("#{:03}  (无法读取)", slot),
                }
            }
            Ok(())
        }
        Command::InspectSave { slot } => {
            let data = saves.load(slot)?;
            println!("{}", data.to_json()?);
            Ok(())
        }
        Command::DeleteSave { slot } => {
            if !saves.exists(slot) {
                bail!("存档 {} 不存在", slot);
            }
            saves.delete(slot)?;
            Ok(())
        }
    }
}

fn run(
    config: &HostConfig,
    saves: &SaveManager,
    frames: u32,
    load: Option<u32>,
    save: Option<u32>,
    text: &str,
) -> Result<()> {
    let mut director = SceneDirector::new(&config.core);
    let persistent = saves.load_persistent()?;
    director
        .variables_mut()
        .restore_persistent(persistent.variables);

    match load {
        Some(slot) => {
            let data = saves.load(slot)?;
            director.load(&data, &demo_factory())?;
        }
        None => {
            director.change_scene(&config.start_scene);
            build_demo_scene(&mut director, text)?;
        }
    }

    let mut loader = RecordingLoader::default();
    for root in director.roots().to_vec() {
        preload(director.tree(), root, &mut loader)?;
    }
    info!(resources = ?loader.requested, "资源预加载完成");

    for frame in 0..frames {
        director.update_frame();
        if frame == 0 {
            director.finish_preparing();
        }
    }

    let vars = director.variables();
    info!(
        frames = director.frame(),
        revealed = vars.number_value_of(&VariableRef::temp(0).into())?,
        total_frames = vars.number_value_of(&VariableRef::global("", 0).into())?,
        entries = vars.number_value_of(&VariableRef::persistent("", 0).into())?,
        "运行结束"
    );

    if let Some(slot) = save {
        saves.save(&director.save(slot)?)?;
    }
    saves.save_persistent(&PersistentData::new(director.variables().persistent_bundle()))?;
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
