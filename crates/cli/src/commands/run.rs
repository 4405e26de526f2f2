//! `alfred run` — execute one task and print the answer.

use super::build_session;

pub async fn run(task: String, role: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let session = build_session(role).await?;
    let answer = session.ask(&task).await;
    println!("{answer}");
    Ok(())
}
