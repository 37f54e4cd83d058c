use crate::config::{Config, load_config};
use crate::family::{FamilyGraph, Gender};
use crate::layout::Point;
use crate::layout_dump::write_layout_dump;
use crate::render::{render_svg, write_output_svg};
use crate::session::{FamilySession, ViewState};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ftree", version, about = "Family tree layout and rendering")]
pub struct Args {
    /// Family file (JSON)
    #[arg(short = 'f', long = "file", global = true, default_value = "family.json")]
    pub file: PathBuf,

    /// Config JSON5 file (theme, layout and render overrides)
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new family file holding a single member
    New {
        name: String,
        #[arg(short = 'g', long, value_parser = parse_gender, default_value = "male")]
        gender: Gender,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Add a child to a member (children of a first spouse belong to the couple)
    AddChild {
        target: String,
        name: String,
        #[arg(short = 'g', long, value_parser = parse_gender, default_value = "male")]
        gender: Gender,
    },
    /// Add a spouse to a main-line member
    AddSpouse {
        target: String,
        name: String,
        #[arg(short = 'g', long, value_parser = parse_gender, default_value = "female")]
        gender: Gender,
    },
    /// Add a parent to a member who married into the family
    AddParent {
        target: String,
        name: String,
        #[arg(short = 'g', long, value_parser = parse_gender, default_value = "male")]
        gender: Gender,
    },
    /// Rename a member
    Rename { target: String, name: String },
    /// Render the forest, or the focus view around a member
    Render {
        /// Output file (svg/png). Defaults to stdout for SVG if omitted.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
        output_format: OutputFormat,

        #[command(flatten)]
        view: ViewArgs,

        /// Highlight a member without changing the view
        #[arg(long)]
        select: Option<String>,

        /// Write the computed layout as JSON
        #[arg(long = "dumpLayout")]
        dump_layout: Option<PathBuf>,
    },
    /// Print the member drawn at a canvas point
    Hit {
        x: f32,
        y: f32,
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct ViewArgs {
    /// Tap this member first (a spouse or added parent opens the focus view)
    #[arg(long)]
    focus: Option<String>,

    /// Width
    #[arg(short = 'w', long = "width")]
    width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    height: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

fn parse_gender(token: &str) -> Result<Gender, String> {
    Gender::from_token(token).ok_or_else(|| format!("unknown gender `{token}`, expected male or female"))
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::New { name, gender, force } => {
            if args.file.exists() && !force {
                anyhow::bail!("{} already exists; pass --force to replace it", args.file.display());
            }
            let mut graph = FamilyGraph::new();
            let id = graph.add_root(name, gender);
            save_family(&args.file, &graph)?;
            println!("{id}");
        }
        Command::AddChild { target, name, gender } => {
            let mut graph = load_family(&args.file)?;
            let id = graph.add_child(&target, name, gender)?;
            save_family(&args.file, &graph)?;
            println!("{id}");
        }
        Command::AddSpouse { target, name, gender } => {
            let mut graph = load_family(&args.file)?;
            let id = graph.add_spouse(&target, name, gender)?;
            save_family(&args.file, &graph)?;
            println!("{id}");
        }
        Command::AddParent { target, name, gender } => {
            let mut graph = load_family(&args.file)?;
            let id = graph.add_parent(&target, name, gender)?;
            save_family(&args.file, &graph)?;
            println!("{id}");
        }
        Command::Rename { target, name } => {
            let mut graph = load_family(&args.file)?;
            graph.rename(&target, name)?;
            save_family(&args.file, &graph)?;
        }
        Command::Render {
            output,
            output_format,
            view,
            select,
            dump_layout,
        } => {
            view.apply_canvas(&mut config);
            let mut session = open_session(&args.file, &config, view.focus.as_deref())?;
            if let Some(id) = select.as_deref()
                && !session.select(id)
            {
                tracing::warn!(member = %id, "cannot select unknown member");
            }

            let layout = session.view_layout(Some(config.render.canvas()));
            let connectors = session.connectors(&layout);
            if let Some(path) = dump_layout.as_deref() {
                write_layout_dump(path, &layout, session.graph(), &connectors, session.zoom_pair())?;
            }
            let svg = render_svg(
                session.graph(),
                &layout,
                &connectors,
                &config.theme,
                &config.layout,
                &config.avatars,
                session.selected(),
            );
            match output_format {
                OutputFormat::Svg => {
                    write_output_svg(&svg, output.as_deref())?;
                }
                OutputFormat::Png => {
                    let output = ensure_output(&output, "png")?;
                    write_png(&svg, &output, &config)?;
                }
            }
        }
        Command::Hit { x, y, view } => {
            view.apply_canvas(&mut config);
            let session = open_session(&args.file, &config, view.focus.as_deref())?;
            let layout = session.view_layout(Some(config.render.canvas()));
            match session.hit_test(&layout, Point::new(x, y)) {
                Some(id) => println!("{id}"),
                None => anyhow::bail!("no member at ({x}, {y})"),
            }
        }
    }
    Ok(())
}

impl ViewArgs {
    fn apply_canvas(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_session(path: &Path, config: &Config, focus: Option<&str>) -> Result<FamilySession> {
    let graph = load_family(path)?;
    let mut session = FamilySession::new(graph, config.layout.clone());
    if let Some(id) = focus {
        session.tap(id);
        if session.view() == &ViewState::Normal {
            tracing::warn!(member = %id, "member has no focus view; showing the whole forest");
        }
    }
    Ok(session)
}

fn load_family(path: &Path) -> Result<FamilyGraph> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading family file {}", path.display()))?;
    let graph = FamilyGraph::from_json(&contents)
        .with_context(|| format!("decoding family file {}", path.display()))?;
    Ok(graph)
}

fn save_family(path: &Path, graph: &FamilyGraph) -> Result<()> {
    std::fs::write(path, graph.to_json()?)
        .with_context(|| format!("writing family file {}", path.display()))?;
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_flags() {
        let args = Args::try_parse_from([
            "ftree", "-f", "fam.json", "render", "--focus", "abc", "-w", "640", "-e", "png", "-o",
            "out.png",
        ])
        .unwrap();
        assert_eq!(args.file, PathBuf::from("fam.json"));
        match args.command {
            Command::Render {
                view, output_format, ..
            } => {
                assert_eq!(view.focus.as_deref(), Some("abc"));
                assert_eq!(view.width, Some(640.0));
                assert!(matches!(output_format, OutputFormat::Png));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn gender_flag_accepts_short_tokens() {
        let args = Args::try_parse_from(["ftree", "add-child", "p1", "Kid", "-g", "f"]).unwrap();
        assert!(matches!(
            args.command,
            Command::AddChild {
                gender: Gender::Female,
                ..
            }
        ));
        assert!(Args::try_parse_from(["ftree", "add-child", "p1", "Kid", "-g", "x"]).is_err());
    }
}
