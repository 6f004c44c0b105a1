use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use esquery::{
    ClientConfig, CompilerConfig, ElasticClient, QueryInput, QueryMetrics, QueryCompiler, Searcher,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "esquery")]
#[command(about = "Compile a JSON query DSL into Elasticsearch bool queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the compiled query for a DSL document
    Compile(CompileArgs),
    /// Compile a query input and run it against a cluster
    Search(SearchArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// File holding the DSL object (stdin when neither --file nor --text is given)
    #[arg(long, env = "ESQUERY_FILE", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// DSL object as inline text
    #[arg(long)]
    text: Option<String>,

    /// Fail on malformed clauses instead of skipping them
    #[arg(long, env = "ESQUERY_STRICT")]
    strict: bool,

    /// Maximum nesting depth of and/or/not nodes
    #[arg(long, env = "ESQUERY_MAX_DEPTH", default_value = "32")]
    max_depth: usize,
}

#[derive(Args)]
struct SearchArgs {
    /// Index to search
    #[arg(long, env = "ESQUERY_INDEX")]
    index: String,

    /// Comma-separated list of cluster URLs
    #[arg(
        long,
        env = "ESQUERY_ADDRESSES",
        value_delimiter = ',',
        default_value = "http://127.0.0.1:9200"
    )]
    addresses: Vec<String>,

    #[arg(long, env = "ESQUERY_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ESQUERY_PASSWORD")]
    password: Option<String>,

    /// File holding a query input document (stdin when absent)
    #[arg(long, env = "ESQUERY_FILE")]
    file: Option<PathBuf>,

    /// Offset of the first hit; overrides `from` in the query input
    #[arg(long)]
    from: Option<usize>,

    /// Page size, 0 meaning 10; overrides `size` in the query input
    #[arg(long)]
    size: Option<usize>,

    #[arg(long, env = "ESQUERY_MAX_RETRIES", default_value = "3")]
    max_retries: u32,

    /// Request timeout in milliseconds
    #[arg(long, env = "ESQUERY_TIMEOUT_MS", default_value = "30000")]
    timeout_ms: u64,

    /// Request gzip-compressed responses
    #[arg(long, env = "ESQUERY_GZIP")]
    gzip: bool,

    #[arg(long, env = "ESQUERY_STRICT")]
    strict: bool,

    /// Print Prometheus metrics to stderr after the search
    #[arg(long)]
    metrics: bool,
}

fn read_source(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn compiler_config(strict: bool, max_depth: usize) -> CompilerConfig {
    let config = if strict {
        CompilerConfig::strict()
    } else {
        CompilerConfig::lenient()
    };
    config.with_max_depth(max_depth)
}

fn compile(args: CompileArgs) -> Result<()> {
    let text = match args.text {
        Some(text) => text,
        None => read_source(args.file.as_ref())?,
    };

    let compiler = QueryCompiler::new(compiler_config(args.strict, args.max_depth));
    let compiled = compiler.compile_str(&text)?;
    if !compiled.report.is_clean() {
        warn!(
            "{} clause(s) skipped, {} key(s) ignored",
            compiled.report.skipped, compiled.report.ignored
        );
    }

    println!("{}", serde_json::to_string_pretty(&compiled.source())?);
    Ok(())
}

async fn search(args: SearchArgs) -> Result<()> {
    let text = read_source(args.file.as_ref())?;
    let input: QueryInput = if text.trim().is_empty() {
        QueryInput::default()
    } else {
        serde_json::from_str(&text).context("query input is not valid JSON")?
    };
    let input = input.with_paging(args.from, args.size);

    let mut config = ClientConfig::new(args.addresses)
        .with_max_retries(args.max_retries)
        .with_gzip(args.gzip)
        .with_timeout(std::time::Duration::from_millis(args.timeout_ms));
    config.username = args.username;
    config.password = args.password;

    info!("Connecting to {:?}", config.addresses);
    let client = ElasticClient::new(config)?;
    let metrics = QueryMetrics::new()?;
    let searcher = Searcher::with_config(client, compiler_config(args.strict, 32))
        .with_metrics(metrics.clone());

    let result = searcher.search_input(&args.index, &input).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if args.metrics {
        eprintln!("{}", metrics.encode()?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("esquery v{}", esquery::VERSION);

    match cli.command {
        Command::Compile(args) => compile(args),
        Command::Search(args) => search(args).await,
    }
}
