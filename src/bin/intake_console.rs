use std::env;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use maternity_intake::config::{load_or_default, workspace_root, NormalizerStrategy};
use maternity_intake::logging::init_logging;
use maternity_intake::{ChatService, InboundMessage, OutboundPrompt};

fn main() -> Result<()> {
    let args = CliArgs::parse()?;
    let root = workspace_root()?;
    let mut config = load_or_default()?;
    if let Some(strategy) = args.strategy {
        config.normalizer.strategy = strategy;
    }
    init_logging(&config.logging)?;

    let mut service = ChatService::from_config(&config, &root)?;
    println!("Intake console for user '{}'. Type /quit to leave.", args.user);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    render(&mut stdout, &service.handle(&InboundMessage::text(&args.user, "/start")))?;
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim() == "/quit" {
            break;
        }
        let reply = service.handle(&InboundMessage::text(&args.user, line));
        render(&mut stdout, &reply)?;
    }
    Ok(())
}

fn render(out: &mut impl Write, reply: &OutboundPrompt) -> Result<()> {
    writeln!(out, "\n{}", reply.text)?;
    if !reply.suggestions.is_empty() {
        let buttons: Vec<String> = reply.suggestions.iter().map(|s| format!("[{s}]")).collect();
        writeln!(out, "{}", buttons.join(" "))?;
    }
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

struct CliArgs {
    user: String,
    strategy: Option<NormalizerStrategy>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut user = "console".to_string();
        let mut strategy = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--user" => {
                    user = args.next().context("Expected a user id after --user")?;
                }
                "--strategy" => {
                    let value = args
                        .next()
                        .context("Expected auto, keyword or lemma after --strategy")?;
                    strategy = Some(parse_strategy(&value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument '{other}'. Run with --help for usage instructions."
                    ));
                }
            }
        }
        Ok(Self { user, strategy })
    }
}

fn parse_strategy(value: &str) -> Result<NormalizerStrategy> {
    match value {
        "auto" => Ok(NormalizerStrategy::Auto),
        "keyword" => Ok(NormalizerStrategy::Keyword),
        "lemma" => Ok(NormalizerStrategy::Lemma),
        other => Err(anyhow!("Unknown strategy '{other}' (expected auto, keyword or lemma)")),
    }
}

fn print_usage() {
    println!("Maternity intake console");
    println!("Runs one interview over stdin/stdout using the workspace configuration.");
    println!("Usage: cargo run --bin intake_console -- [options]");
    println!("Options:");
    println!("  --user <id>            Transport user id for the session (default: console)");
    println!("  --strategy <name>      Override the normalizer strategy (auto, keyword, lemma)");
}
