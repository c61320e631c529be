//! ogex CLI
//!
//! Command-line interface for exporting scene descriptions to OpenGEX and
//! inspecting their meshes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use ogex_ddl::{DataType, EncodeOptions, EncodingMode, UnresolvedPolicy};
use ogex_export::logging::{init_with_config, TracingConfig};
use ogex_export::{inspect_mesh, ExportOptions, MeshReport, OgexExporter, SceneDescription, VertexAttributes};

/// ogex - OpenGEX scene exporter
#[derive(Parser)]
#[command(name = "ogex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for reports
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene description to an OpenGEX file
    Export(ExportArgs),

    /// Show per-mesh corner, vertex and triangle counts
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Scene description (.json, .yaml, .yml)
    #[arg(short, long)]
    input: PathBuf,

    /// Output .ogex file
    #[arg(short, long)]
    output: PathBuf,

    /// Write without whitespace or comments
    #[arg(long)]
    compressed: bool,

    /// Decimal places for floating point values
    #[arg(long, default_value = "6", conflicts_with = "no_rounding")]
    rounding: u32,

    /// Write floating point values at full precision
    #[arg(long)]
    no_rounding: bool,

    /// Fail on references the scene cannot satisfy instead of writing null
    #[arg(long)]
    strict_refs: bool,

    /// Skip normal arrays
    #[arg(long)]
    no_normals: bool,

    /// Skip vertex color arrays
    #[arg(long)]
    no_colors: bool,

    /// Skip texture coordinate arrays
    #[arg(long)]
    no_texcoords: bool,

    /// Vertex array elements per line
    #[arg(long, default_value = "8")]
    per_line: usize,

    /// Comment each node with its scene name
    #[arg(long)]
    annotate: bool,

    /// Index array type: unsigned_int8, unsigned_int16, unsigned_int32 or unsigned_int64
    #[arg(long, default_value = "unsigned_int32")]
    index_type: DataType,
}

impl ExportArgs {
    fn options(&self) -> ExportOptions {
        ExportOptions {
            encode: EncodeOptions {
                mode: if self.compressed {
                    EncodingMode::Compressed
                } else {
                    EncodingMode::Verbose
                },
                rounding: (!self.no_rounding).then_some(self.rounding),
            },
            unresolved: if self.strict_refs {
                UnresolvedPolicy::Error
            } else {
                UnresolvedPolicy::Null
            },
            export_normals: !self.no_normals,
            export_colors: !self.no_colors,
            export_texcoords: !self.no_texcoords,
            vertex_values_per_line: Some(self.per_line),
            annotate: self.annotate,
            index_type: self.index_type,
        }
    }
}

#[derive(Args)]
struct InspectArgs {
    /// Scene description (.json, .yaml, .yml)
    #[arg(short, long)]
    input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_config(TracingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    info!("Loading scene: {:?}", args.input);

    let options = args.options();
    options.validate().context("Invalid export options")?;

    let exporter = OgexExporter::with_options(options);
    let summary = exporter
        .export_file(&args.input, &args.output)
        .context("Failed to export scene")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("Exported {:?}", args.output);
            println!("  Nodes:            {}", summary.nodes);
            println!("  Geometry objects: {}", summary.geometry_objects);
            println!("  Materials:        {}", summary.materials);
            println!("  Corners:          {}", summary.corners);
            println!("  Vertices:         {}", summary.vertices);
            println!("  Triangles:        {}", summary.triangles);
        }
    }

    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let scene = SceneDescription::load(&args.input).context("Failed to load scene")?;

    let reports = scene
        .meshes
        .iter()
        .map(|mesh| inspect_mesh(mesh, VertexAttributes::default()))
        .collect::<Result<Vec<MeshReport>, _>>()
        .context("Failed to weld meshes")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": args.input,
                "scale": scene.scale,
                "nodes": scene.node_count(),
                "materials": scene.materials.len(),
                "meshes": reports,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Scene: {:?}", args.input);
            println!("  Scale:     {}", scene.scale);
            println!("  Nodes:     {}", scene.node_count());
            println!("  Materials: {}", scene.materials.len());
            println!("  Meshes:    {}", reports.len());

            for report in &reports {
                let ratio = if report.corners > 0 {
                    report.vertices as f64 / report.corners as f64 * 100.0
                } else {
                    0.0
                };
                println!(
                    "\n  {}: {} corners -> {} vertices ({:.1}%), {} triangles, {} material groups",
                    report.name, report.corners, report.vertices, ratio, report.triangles, report.materials
                );
            }
        }
    }

    Ok(())
}
