use docopt::Docopt;
use serde_derive::Deserialize;
use simplelog::LevelFilter;
use modular_mazes::{
    config::{CaveStyle, MapConfig, VoronoiConfig},
    displays::MazeOverview,
    errors::*,
    generator::{self, Maze},
    renderers,
};
use std::{
    io,
    io::prelude::*,
    fs::File,
    path::Path
};

const USAGE: &str = "Modular mazes

Usage:
    modular_mazes_driver -h | --help
    modular_mazes_driver [--width=<w> --height=<h>] [--spacing=<s>] [--module-spacing=<g>] [--seed=<n>] [--modules=<n>] [--branching-start=<n>] [--caves [--cave-style=<style>] [--cave-seeds=<n>] [--cave-threshold=<t>] [--cave-variation=<v>] [--cave-weights=<c,s,x>] [--cross-arm-width=<w>]] [--text-out=<path>] [--show-modules] [--image-out=<path> [--tile-pixels=<n>]] [--save-edges=<path>] [-v | -q]

Options:
    -h --help                Show this screen.
    --width=<w>              Tiles across one module [default: 13].
    --height=<h>             Tiles along one module [default: 13].
    --spacing=<s>            World distance between neighbouring tiles [default: 1.2].
    --module-spacing=<g>     Extra world gap between neighbouring modules [default: 0.0].
    --seed=<n>               Base random seed, the same seed always grows the same maze [default: 42].
    --modules=<n>            Number of path modules to build before exits get sealed [default: 10].
    --branching-start=<n>    Let modules from build index n onwards spawn side branches.
    --caves                  Carve a cave around the path of every 8th and 10th module.
    --cave-style=<style>     square or voronoi [default: square].
    --cave-seeds=<n>         Number of Voronoi seeds per cave [default: 6].
    --cave-threshold=<t>     Reach of a cave from its centre or seeds, in tiles [default: 3.0].
    --cave-variation=<v>     Relative jitter of each Voronoi seed's reach [default: 0.25].
    --cave-weights=<c,s,x>   Relative odds of circle, square and cross shaped Voronoi cells [default: 1,1,1].
    --cross-arm-width=<w>    Arm width of cross shaped cells as a fraction of their reach [default: 0.35].
    --text-out=<path>        Output file path for the text summary instead of stdout.
    --show-modules           Add the tile layout of every module to the text summary.
    --image-out=<path>       Output file path for a top-down image of the maze. Always PNG format.
    --tile-pixels=<n>        Pixel count to render one tile in the image [default: 4].
    --save-edges=<path>      Serialize the module graph to a text file: each line is a pair of numbers. Line 1: n(#vertices) m(#edges). Line 2+ edge between vertices. Uses 1-based vertex indices.
    -v --verbose             Log every placement, branch and cave.
    -q --quiet               Only log warnings and errors.
";
#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_width: usize,
    flag_height: usize,
    flag_spacing: f32,
    flag_module_spacing: f32,
    flag_seed: u64,
    flag_modules: usize,
    flag_branching_start: Option<usize>,
    flag_caves: bool,
    flag_cave_style: String,
    flag_cave_seeds: usize,
    flag_cave_threshold: f32,
    flag_cave_variation: f32,
    flag_cave_weights: String,
    flag_cross_arm_width: f32,
    flag_text_out: String,
    flag_show_modules: bool,
    flag_image_out: String,
    flag_tile_pixels: u32,
    flag_save_edges: String,
    flag_verbose: bool,
    flag_quiet: bool,
}

fn main() -> Result<()> {

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    init_logging(&args)?;

    let maze = generator::generate(map_config_from_args(&args)?)?;

    let summary = maze_summary(&maze, args.flag_show_modules);
    if args.flag_text_out.is_empty() {
        print!("{}", summary);
    } else {
        write_text_to_file(&summary, &args.flag_text_out)
            .chain_err(|| format!("Failed to write maze summary to text file {}", args.flag_text_out))?;
    }

    if !args.flag_image_out.is_empty() {
        renderers::render_overview_png(&maze, args.flag_tile_pixels, Path::new(&args.flag_image_out))?;
    }

    if !args.flag_save_edges.is_empty() {
        save_maze_graph(&maze, &args.flag_save_edges)?;
    }

    Ok(())
}

fn init_logging(args: &MazeArgs) -> Result<()> {
    let level = if args.flag_verbose {
        LevelFilter::Debug
    } else if args.flag_quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    simplelog::TermLogger::init(level,
                                simplelog::ConfigBuilder::new()
                                    .set_target_level(LevelFilter::Off)
                                    .set_location_level(LevelFilter::Off)
                                    .build(),
                                simplelog::TerminalMode::Stderr,
                                simplelog::ColorChoice::Auto)?;
    Ok(())
}

fn map_config_from_args(args: &MazeArgs) -> Result<MapConfig> {
    let style = match args.flag_cave_style.to_lowercase().as_str() {
        "square" => CaveStyle::Square,
        "voronoi" => CaveStyle::Voronoi,
        other => {
            return Err(ErrorKind::InvalidConfig(format!("unknown cave style '{}'", other)).into())
        }
    };

    let (circle_weight, square_weight, cross_weight) =
        VoronoiConfig::parse_shape_weights(&args.flag_cave_weights)?;

    Ok(MapConfig {
        width: args.flag_width,
        height: args.flag_height,
        spacing: args.flag_spacing,
        module_spacing: args.flag_module_spacing,
        seed: args.flag_seed,
        module_count: args.flag_modules,
        branching: args.flag_branching_start,
        voronoi: VoronoiConfig {
            enabled: args.flag_caves,
            style,
            seed_count: args.flag_cave_seeds,
            threshold: args.flag_cave_threshold,
            variation: args.flag_cave_variation,
            circle_weight,
            square_weight,
            cross_weight,
            cross_arm_width: args.flag_cross_arm_width,
        },
    })
}

fn maze_summary(maze: &Maze, show_modules: bool) -> String {
    let mut text = MazeOverview::new(maze).to_string();
    if show_modules {
        for module in maze.modules() {
            text.push('\n');
            text.push_str(&module.to_string());
        }
    }
    text
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

fn save_maze_graph(maze: &Maze, file_path: &str) -> Result<()> {

    let graph = maze.graph();
    let mut graph_data = String::new();
    graph_data.push_str(graph.node_count().to_string().as_ref());
    graph_data.push(' ');
    graph_data.push_str(graph.edge_count().to_string().as_ref());
    graph_data.push('\n');

    for edge in graph.raw_edges() {
        let src_as_1_based_index = edge.source().index() + 1;
        let dst_as_1_based_index = edge.target().index() + 1;

        graph_data.push_str(src_as_1_based_index.to_string().as_ref());
        graph_data.push(' ');
        graph_data.push_str(dst_as_1_based_index.to_string().as_ref());
        graph_data.push('\n');
    }

    write_text_to_file(&graph_data, file_path)
        .chain_err(|| format!("Failed to write maze graph to text file {}", file_path))?;

    Ok(())
}
