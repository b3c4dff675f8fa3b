use matchmaker_client::ChatSession;
use matchmaker_client::chat::GREETING;
use std::io::{self, BufRead, Write};

use crate::{AppContext, AuthGate};

/// Chat REPL. Unavailable without a session.
pub async fn repl(ctx: &AppContext) -> anyhow::Result<()> {
    let AuthGate::Authenticated(_) = ctx.gate else {
        println!("Chat is available after you log in.");
        return Ok(());
    };

    println!("AI Clinical Assistant (type `exit` to leave)");
    println!("assistant: {GREETING}");

    let mut chat = ChatSession::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("you: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let question = line.trim();

        if question == "exit" || question == "quit" {
            break;
        }
        if let Some(reply) = chat.send(ctx.api.as_ref(), question).await {
            println!("assistant: {}", reply.content);
        }
    }
    Ok(())
}
