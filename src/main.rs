use clap::{Args, Parser as ClapParser, Subcommand};
use predicate_spec::cli::{self, CheckOptions, CheckResult, CliError, Mode};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "pspec")]
#[command(about = "Filter expressions over JSON: validate, match in memory, or compile to SQL")]
#[command(version)]
struct Cli {
    /// Log parsing, caching and alias allocation
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ParamArgs {
    /// Positional parameter as JSON, once per placeholder in order
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Named parameter as name=JSON
    #[arg(short, long)]
    named: Vec<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a template and print its parsed form
    Check {
        /// The filter template, e.g. '$[?(@.age >= %d)]'
        template: String,
    },

    /// Evaluate a template against a JSON document
    Match {
        template: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Compile a template to a parameterized SQL condition
    Sql {
        template: String,

        /// Schema file describing how collections are stored
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Table the condition applies to
        #[arg(short, long)]
        table: Option<String>,

        #[command(flatten)]
        params: ParamArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Check { template } => run(
            CheckOptions {
                template,
                mode: Mode::Syntax,
                ..Default::default()
            },
            false,
        ),
        Commands::Match {
            template,
            input,
            params,
        } => read_input(input).and_then(|input| {
            run(
                CheckOptions {
                    template,
                    mode: Mode::Match,
                    input,
                    params: params.params,
                    named: params.named,
                    ..Default::default()
                },
                params.pretty,
            )
        }),
        Commands::Sql {
            template,
            schema,
            table,
            params,
        } => schema
            .map(fs::read_to_string)
            .transpose()
            .map_err(CliError::Io)
            .and_then(|schema| {
                run(
                    CheckOptions {
                        template,
                        mode: Mode::Sql,
                        params: params.params,
                        named: params.named,
                        schema,
                        table,
                        ..Default::default()
                    },
                    params.pretty,
                )
            }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run(options: CheckOptions, pretty: bool) -> Result<(), CliError> {
    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid(tree) => println!("Syntax is valid: {}", tree),
        result => {
            let output = result.to_json();
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
