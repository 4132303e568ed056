use clap::Parser;

mod bodies;
mod demo;
mod dump;
mod render;
mod stages;

#[derive(Parser)]
struct Cli {
    /// Bind the demo program and stop after name resolution.
    #[arg(long, group = "stage")]
    bind: bool,

    /// Run binding and type checking.
    #[arg(long, group = "stage")]
    check: bool,

    /// Run the pipeline through lowering and dump the lowered trees.
    #[arg(long, group = "stage")]
    lower: bool,

    /// Run the pipeline through control-flow analysis.
    #[arg(long, group = "stage")]
    cfa: bool,

    /// Run the whole pipeline and dump the recorded IR.
    #[arg(long, group = "stage")]
    emit: bool,

    /// Enable tracing output (respects RUST_LOG).
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("verbose tracing enabled");
    }

    let result = if cli.bind {
        stages::bind_stage()
    } else if cli.check {
        stages::check_stage()
    } else if cli.lower {
        stages::lower_stage()
    } else if cli.cfa {
        stages::cfa_stage()
    } else {
        // --emit and the default both go through the entire pipeline
        stages::emit_stage()
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
