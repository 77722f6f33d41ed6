use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xmlbind::xml::{WriteOptions, Writer};
use xmlbind::{Document, NodeId, ParseOptions};

#[derive(Debug, Parser)]
#[command(
    name = "xmlbind",
    version,
    about = "Query and reformat XML documents"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reformat a document
    Fmt {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        #[command(flatten)]
        write: WriteArgs,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Print every element matching a selector, e.g. `Item[id=2]`
    Find {
        selector: String,
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Only test the root's direct children
        #[arg(long)]
        shallow: bool,
        /// Print text values instead of markup
        #[arg(long)]
        values: bool,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Resolve a `/`-separated path and print the element's text value
    Get {
        path: String,
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        /// Print every sibling matching the last segment
        #[arg(long)]
        all: bool,
        /// Print markup instead of the text value
        #[arg(long)]
        xml: bool,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Print an indented outline of the element tree
    Tree {
        /// Input file (defaults to stdin)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,
        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(Debug, ClapArgs)]
struct ParseArgs {
    /// Keep whitespace-only text as element values
    #[arg(long)]
    keep_whitespace: bool,
    /// Maximum element nesting depth (0 = unlimited)
    #[arg(long, default_value_t = 256)]
    max_depth: u16,
}

impl From<&ParseArgs> for ParseOptions {
    fn from(args: &ParseArgs) -> Self {
        ParseOptions::default()
            .with_ignore_whitespace(!args.keep_whitespace)
            .with_max_depth(args.max_depth)
    }
}

#[derive(Debug, ClapArgs)]
struct WriteArgs {
    /// Spaces per nesting level
    #[arg(long, default_value_t = 2)]
    indent: usize,
    /// Omit the `<?xml ...?>` declaration
    #[arg(long)]
    no_declaration: bool,
}

impl From<&WriteArgs> for WriteOptions {
    fn from(args: &WriteArgs) -> Self {
        WriteOptions::default()
            .with_indent(args.indent)
            .with_declaration(!args.no_declaration)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    match args.command {
        Command::Fmt {
            input,
            output,
            write,
            parse,
        } => {
            let mut doc = load(&input, &parse)?;
            let mut text = doc
                .to_xml_with(WriteOptions::from(&write))
                .context("failed to write document")?;
            text.push('\n');
            write_output(&output, text.as_bytes())
        }
        Command::Find {
            selector,
            input,
            shallow,
            values,
            parse,
        } => {
            let doc = load(&input, &parse)?;
            let found = doc
                .find(doc.root(), &selector, !shallow)
                .with_context(|| format!("failed to search for '{selector}'"))?;
            debug!(matches = found.len(), "search finished");
            print_elements(&doc, &found, !values)
        }
        Command::Get {
            path,
            input,
            all,
            xml,
            parse,
        } => {
            let doc = load(&input, &parse)?;
            let found = if all {
                doc.access_all(doc.root(), &path)
            } else {
                doc.access(doc.root(), &path)
                    .map(|found| found.into_iter().collect())
            }
            .with_context(|| format!("failed to resolve '{path}'"))?;
            if found.is_empty() {
                bail!("no element at path '{path}'");
            }
            print_elements(&doc, &found, xml)
        }
        Command::Tree { input, parse } => {
            let doc = load(&input, &parse)?;
            let outline = doc.print(doc.root())?;
            write_output(&None, outline.as_bytes())
        }
    }
}

fn load(path: &Option<PathBuf>, parse: &ParseArgs) -> Result<Document> {
    let text = read_input(path)?;
    let source = path
        .as_ref()
        .map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    Document::parse_with(&text, ParseOptions::from(parse))
        .with_context(|| format!("failed to parse {source}"))
}

fn print_elements(doc: &Document, ids: &[NodeId], markup: bool) -> Result<()> {
    let writer = Writer::new(WriteOptions::default().with_declaration(false));
    let mut out = String::new();
    for id in ids {
        if markup {
            out.push_str(&writer.write(doc, *id)?);
        } else {
            out.push_str(doc.element(*id)?.value().unwrap_or_default());
        }
        out.push('\n');
    }
    write_output(&None, out.as_bytes())
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
