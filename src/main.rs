use clap::{
    crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches,
    Command,
};

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("push")
                .alias("push_file")
                .about("Pushes a local file to a blob-storage account")
                .arg(Arg::new("file").help("local file to upload").required(true))
                .arg(
                    Arg::new("connection-string")
                        .help("storage connection string; falls back to zipctl.toml when omitted"),
                ),
        )
        .subcommand(
            Command::new("pull")
                .alias("pull_file")
                .about("Extracts a zip archive into a destination directory")
                .arg(Arg::new("source").help("zip archive to extract").required(true))
                .arg(
                    Arg::new("destination")
                        .help("directory the archive is extracted into")
                        .required(true),
                )
                .arg(
                    Arg::new("replace")
                        .help("delete an existing destination directory first")
                        .short('r')
                        .long("replace")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let is_verbose = matches.get_flag("verbose");

    init_logger(is_verbose);

    let (command, args) = matches.subcommand().expect("subcommand required");

    let result = match command {
        "push" => handle_push(args),
        "pull" => handle_pull(args),
        _ => unreachable!(),
    };

    if result.is_err() {
        log::error!("could not execute command {}", command);
    }

    result
}

fn init_logger(is_verbose: bool) {
    let level = if is_verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn handle_push(args: &ArgMatches) -> miette::Result<()> {
    let file = args.get_one::<String>("file").expect("file required");
    let connection_string = args
        .get_one::<String>("connection-string")
        .map(|value| value.as_str());

    zipctl::api::push_file(file, connection_string)?;

    Ok(())
}

fn handle_pull(args: &ArgMatches) -> miette::Result<()> {
    let source = args.get_one::<String>("source").expect("source required");
    let destination = args
        .get_one::<String>("destination")
        .expect("destination required");

    let replace = args.get_flag("replace");

    zipctl::api::pull_file(source, destination, replace)?;

    Ok(())
}
