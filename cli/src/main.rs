use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pages::{PageError, SystemVariableSource, UrlPathVariableSource, WikiPage, load_tree};
use wiki_cli::{open_page, test_runner};
use wikitext::{FragmentPage, ParseError, VariableSource, translate_fragment};

#[derive(Parser)]
#[command(name = "wiki", version, about = "Wiki markup renderer")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log at debug level (overridden by WIKI_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a page of a wiki directory to HTML
    Render(RenderArgs),

    /// Print the rendered value of a variable as seen from a page
    Variable(VariableArgs),

    /// List the pages of a wiki directory
    Tree(TreeArgs),

    /// Render a piece of markup that belongs to no page
    Fragment(FragmentArgs),

    /// Run .test.wiki test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct HostArgs {
    /// Host variable, NAME=VALUE. Repeatable.
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    vars: Vec<(String, String)>,

    /// Request URL variable, NAME=VALUE. Repeatable.
    #[arg(long = "url-var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    url_vars: Vec<(String, String)>,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Wiki directory
    dir: PathBuf,

    /// Full name of the page, e.g. FrontPage.SubPage (default: the root)
    #[arg(default_value = "")]
    page: String,

    #[command(flatten)]
    host: HostArgs,
}

#[derive(clap::Args)]
struct VariableArgs {
    /// Wiki directory
    dir: PathBuf,

    /// Full name of the page
    page: String,

    /// Variable name
    name: String,

    #[command(flatten)]
    host: HostArgs,
}

#[derive(clap::Args)]
struct TreeArgs {
    /// Wiki directory
    dir: PathBuf,
}

#[derive(clap::Args)]
struct FragmentArgs {
    /// Markup to render; `-` reads standard input
    markup: String,

    /// Page every wiki word in the fragment links to
    #[arg(long)]
    target: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.wiki file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Render(args) => do_render(args),
        Command::Variable(args) => do_variable(args),
        Command::Tree(args) => do_tree(args),
        Command::Fragment(args) => do_fragment(args),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            process::exit(test_runner::run_tests(path, cli.no_color, &args.category));
        }
    };

    if let Err(error) = result {
        report(&error, cli.no_color);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("WIKI_LOG")
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", arg))?;
    if name.is_empty() {
        return Err(format!("missing variable name in '{}'", arg));
    }
    Ok((name.to_string(), value.to_string()))
}

/// The host source pages resolve unknown variables through.
fn host_source(dir: &Path, host: &HostArgs) -> Arc<dyn VariableSource> {
    let system = host.vars.iter().fold(
        SystemVariableSource::new().with_root_path(dir.display().to_string()),
        |source, (name, value)| source.with_property(name, value),
    );
    let url: HashMap<String, String> = host.url_vars.iter().cloned().collect();
    Arc::new(UrlPathVariableSource::new(Arc::new(system), url))
}

fn do_render(args: RenderArgs) -> Result<(), CliError> {
    let opened = open_page(&args.dir, &args.page, host_source(&args.dir, &args.host))?;
    print!("{}", opened.page.html()?);
    Ok(())
}

fn do_variable(args: VariableArgs) -> Result<(), CliError> {
    let opened = open_page(&args.dir, &args.page, host_source(&args.dir, &args.host))?;
    match opened.page.variable(&args.name)? {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(CliError::Message(format!(
            "variable {} is not defined for {}",
            args.name, args.page
        ))),
    }
}

fn do_tree(args: TreeArgs) -> Result<(), CliError> {
    fn print_page(page: &Arc<dyn WikiPage>, indent: usize) {
        for child in page.children() {
            println!("{}{}", "  ".repeat(indent), child.name());
            print_page(&child, indent + 1);
        }
    }

    let root: Arc<dyn WikiPage> = load_tree(&args.dir, Arc::new(SystemVariableSource::new()))?;
    println!("{}", root.name());
    print_page(&root, 1);
    Ok(())
}

fn do_fragment(args: FragmentArgs) -> Result<(), CliError> {
    let markup = if args.markup == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| CliError::Message(format!("cannot read standard input: {}", e)))?;
        buffer
    } else {
        args.markup
    };

    let mut page = FragmentPage::new();
    if let Some(target) = args.target {
        page = page.with_target_path(target);
    }
    let html = translate_fragment(&markup, page).map_err(|errors| CliError::Parse {
        name: "<fragment>".to_string(),
        content: markup.clone(),
        errors,
    })?;
    print!("{}", html);
    Ok(())
}

enum CliError {
    Parse {
        name: String,
        content: String,
        errors: Vec<ParseError>,
    },
    Message(String),
}

impl From<PageError> for CliError {
    fn from(error: PageError) -> Self {
        match error {
            PageError::Parse {
                page,
                content,
                errors,
            } => CliError::Parse {
                name: if page.is_empty() { "<root>".to_string() } else { page },
                content,
                errors,
            },
            other => CliError::Message(other.to_string()),
        }
    }
}

fn report(error: &CliError, no_color: bool) {
    match error {
        CliError::Parse {
            name,
            content,
            errors,
        } => {
            let color_choice = if no_color {
                ColorChoice::Never
            } else {
                ColorChoice::Auto
            };
            let mut files = SimpleFiles::new();
            let file_id = files.add(name.clone(), content.clone());
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in errors {
                let diagnostic = error.to_diagnostic(file_id);
                let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
        }
        CliError::Message(message) => eprintln!("error: {}", message),
    }
}
