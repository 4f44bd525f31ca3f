//! Relay server binary.
//! Run with: cargo run --bin murmur-server

use std::process::ExitCode;

use murmur_chat::start_murmur_chat;

fn main() -> ExitCode {
    start_murmur_chat::run()
}
