use matchmaker_client::{ClientError, SessionStore, SignupRequest};
use tracing::info;

use crate::AppContext;

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> anyhow::Result<()> {
    match ctx.api.login(email, password).await {
        Ok(session) => {
            ctx.session_store.save(&session)?;
            info!(user_id = %session.user_id, "session stored");
            println!("Welcome back, {} {}.", session.first_name, session.last_name);
            Ok(())
        }
        Err(ClientError::Api { message, .. }) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn signup(
    ctx: &AppContext,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    let request = SignupRequest::patient(first_name, last_name, email, password);
    match ctx.api.signup(&request).await {
        Ok(session) => {
            ctx.session_store.save(&session)?;
            println!("Signup successful! You can now create your medical profile:");
            println!("  matchmaker profile create");
            Ok(())
        }
        Err(ClientError::Api { message, .. }) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn logout(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.session_store.clear()?;
    println!("Logged out.");
    Ok(())
}
