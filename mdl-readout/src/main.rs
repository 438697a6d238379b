use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use common::prelude::{DirFileSystem, VFileSystem};
use ini::Ini;
use studio::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Print the metadata and dependencies of Source models", long_about = None)]
struct Cli {
    /// Model paths, relative to the search roots
    #[arg(required = true)]
    models: Vec<String>,

    /// Game content directory. Repeatable, searched in order
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// INI file whose [filesystem] section lists more roots
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only report the textures of these skins
    #[arg(short, long = "skin")]
    skins: Vec<usize>,

    /// Log decoding progress
    #[arg(short, long)]
    verbose: bool,
}

/// Every `root` key of the `[filesystem]` section.
fn roots_from_ini(ini: &Ini) -> Vec<PathBuf> {
    ini.section(Some("filesystem"))
        .map(|section| section.get_all("root").map(PathBuf::from).collect())
        .unwrap_or_default()
}

fn build_filesystem(cli: &Cli) -> Result<DirFileSystem> {
    let mut fs = DirFileSystem::new(cli.roots.clone());

    if let Some(config) = &cli.config {
        let ini = Ini::load_from_file(config)
            .with_context(|| format!("failed to read config {config:?}"))?;
        for root in roots_from_ini(&ini) {
            fs.push_root(root);
        }
    }
    if fs.roots().is_empty() {
        fs.push_root(PathBuf::from("."));
    }
    log::debug!("search roots: {:?}", fs.roots());
    Ok(fs)
}

fn print_list(title: &str, items: &[String]) {
    println!("  {title}: {}", items.len());
    for item in items {
        println!("    {item}");
    }
}

fn print_model(fs: &dyn VFileSystem, path: &str, model: &Model, skins: &[usize]) {
    println!("{path}");
    println!("  name: {} (version {})", model.name, model.version);
    println!("  flags: {:?}", model.flags);
    println!("  surface prop: {:?}, mass {}", model.surface_prop, model.mass);

    println!("  bones: {}", model.bones.len());
    for bone in &model.bones {
        let parent = bone
            .parent
            .and_then(|p| model.bones.get(p))
            .map_or("-", |p| p.name.as_str());
        println!("    {} <- {}", bone.name, parent);
    }

    println!("  attachments: {}", model.attachments.len());
    for attachment in &model.attachments {
        let bone = model
            .bones
            .get(attachment.local_bone)
            .map_or("?", |b| b.name.as_str());
        println!("    {} on {} at {}", attachment.name, bone, attachment.offset);
    }

    println!("  pose parameters: {}", model.pose_params.len());
    for param in &model.pose_params {
        println!("    {} [{}, {}]", param.name, param.start, param.end);
    }

    println!("  sequences: {}", model.sequences.len());
    for seq in &model.sequences {
        println!("    {} ({})", seq.label, seq.activity_name);
        for event in &seq.events {
            println!(
                "      {:.3} {} {:?}",
                event.cycle,
                event.kind.name(),
                event.options
            );
        }
    }

    println!("  skins: {}", model.skins.len());
    for (i, skin) in model.skins.iter().enumerate() {
        println!("    {i}: {}", skin.join(", "));
    }
    print_list("cdmaterials", &model.cdmaterials);

    let filter = (!skins.is_empty()).then_some(skins);
    print_list("textures", &model.iter_textures(fs, filter));
    print_list("sounds", &model.find_sounds());
    print_list("particles", &model.find_particles());

    let included: Vec<String> = model
        .included_models
        .iter()
        .map(|m| m.filename.clone())
        .collect();
    print_list("included models", &included);
    print_list("break models", &model.find_break_models());
    print_list("files", &companion_files(fs, path));
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let fs = build_filesystem(&cli)?;

    let mut failed = 0;
    for path in &cli.models {
        match Model::load(&fs, path) {
            Ok(model) => print_model(&fs, path, &model, &cli.skins),
            Err(e) => {
                eprintln!("{path}: {:#}", anyhow::Error::from(e));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} models failed to load", cli.models.len());
    }
    Ok(())
}
