use anyhow::Result;
use clap::Parser;

use groom::cli::handlers::{CommandContext, RunArgs, handle_init, handle_run, handle_source};
use groom::cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    groom::logging::init(cli.verbose, cli.log_file.clone());

    match cli.command {
        Commands::Init {
            velocity,
            team_size,
            ready_max_effort,
            goal,
            force,
        } => handle_init(velocity, team_size, ready_max_effort, goal, force),
        Commands::Run {
            file,
            format,
            goal,
            velocity,
            filter,
            top,
            recommend,
            push_dir,
            generate_ids,
            sequential,
        } => {
            let mut ctx = CommandContext::load(cli.config.as_deref())?;
            tracing::debug!(root = %ctx.root.display(), "Loaded configuration");
            handle_run(
                &mut ctx,
                RunArgs {
                    file,
                    format,
                    goals: goal,
                    velocity,
                    filter,
                    top,
                    recommend,
                    push_dir,
                    generate_ids,
                    sequential,
                },
            )
        }
        Commands::Source { file, id, json } => {
            let ctx = CommandContext::load(cli.config.as_deref())?;
            handle_source(&ctx, &file, &id, json)
        }
    }
}
