//! Terminal chat client for the murmur relay.
//!
//! Reads lines from stdin, submits them as chat turns and prints the
//! assistant's reply as it streams. Slash commands control the model,
//! extended reasoning, web search, attachments and history.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;

use murmur_chat::client::ChatSession;
use murmur_chat::config::{ClientConfig, SearchConfig};
use murmur_chat::error::ChatError;
use murmur_chat::message::Role;

const HELP: &str = "\
commands:
  /model <sonnet-4.5|opus-4.1>  select the model
  /think                        toggle extended reasoning
  /search                       toggle web search
  /attach <path>                stage a file for the next message
  /history                      print the conversation so far
  /clear                        delete the conversation
  /quit                         exit";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    match run_repl() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run_repl() -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to create runtime")?;

    let mut session = rt
        .block_on(ChatSession::new(
            ClientConfig::from_env(),
            SearchConfig::from_env(),
        ))
        .context("failed to create chat session")?;

    println!("murmur chat v{}", env!("CARGO_PKG_VERSION"));
    println!("{HELP}");
    if !session.messages().is_empty() {
        println!("(restored {} messages)", session.messages().len());
    }

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !dispatch_command(&rt, &mut session, command)? {
                break;
            }
            continue;
        }

        submit_turn(&rt, &mut session, line);
    }

    Ok(())
}

/// Handle one slash command; returns false to exit the loop.
fn dispatch_command(
    rt: &tokio::runtime::Runtime,
    session: &mut ChatSession,
    command: &str,
) -> anyhow::Result<bool> {
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, arg)| (name, arg.trim()));

    match name {
        "quit" | "exit" => return Ok(false),
        "help" => println!("{HELP}"),
        "model" => {
            if arg.is_empty() {
                println!("model: {}", session.model());
            } else {
                session.set_model(arg);
                println!("model set to {arg}");
            }
        }
        "think" => {
            let on = session.toggle_thinking();
            println!("extended reasoning {}", if on { "on" } else { "off" });
        }
        "search" => {
            let on = session.toggle_web_search();
            if on && !session.search_configured() {
                println!("note: no search API key configured, searches will return nothing");
            }
            println!("web search {}", if on { "on" } else { "off" });
        }
        "attach" => {
            if arg.is_empty() {
                println!("usage: /attach <path>");
            } else {
                match rt.block_on(session.attach(Path::new(arg))) {
                    Ok(()) => {
                        let (images, documents) = session.pending_attachments();
                        println!("staged ({images} images, {documents} documents)");
                    }
                    Err(err) => println!("could not attach: {err}"),
                }
            }
        }
        "history" => {
            for message in session.messages() {
                let who = match message.role {
                    Role::User => "you",
                    Role::Assistant => "assistant",
                };
                println!("{who}> {}", message.text);
            }
        }
        "clear" => {
            rt.block_on(session.clear())?;
            println!("conversation cleared");
        }
        other => println!("unknown command: /{other}"),
    }
    Ok(true)
}

/// Submit one turn and stream the reply to stdout.
fn submit_turn(rt: &tokio::runtime::Runtime, session: &mut ChatSession, text: &str) {
    print!("assistant> ");
    let _ = io::stdout().flush();

    let outcome = rt.block_on(session.submit(text, |fragment| {
        print!("{fragment}");
        let _ = io::stdout().flush();
    }));
    println!();

    if let Err(err) = outcome {
        match err {
            ChatError::Validation(message) => eprintln!("rejected: {message}"),
            other => eprintln!("error: {other}"),
        }
    }
}
