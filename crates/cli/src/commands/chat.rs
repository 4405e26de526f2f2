//! `alfred chat` — interactive session with persistent memory.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::build_session;

pub async fn run(role: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let session = build_session(role).await?;

    println!();
    println!("  alfred — interactive session");
    println!("  Type your request and press Enter. 'exit' or Ctrl+D to quit.");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        let answer = session.ask(input).await;
        println!();
        for line in answer.lines() {
            println!("  Alfred > {line}");
        }
        println!();

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
