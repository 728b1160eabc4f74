mod cli;
mod compile;
mod config;

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    let sql = match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            return Ok(());
        }
        cli::Command::Read(args) => compile::read(&args)?,
        cli::Command::Write(args) => compile::write(&args)?,
        cli::Command::Schema(args) => compile::schema(&args)?,
    };
    println!("{sql}");
    Ok(())
}
