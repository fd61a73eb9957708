use meshcore::cli;

fn main() -> anyhow::Result<()> {
    cli::run_cli()
}
