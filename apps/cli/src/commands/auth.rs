//! # Auth Commands

use anyhow::{Context, Result};
use tracing::debug;

use posflow_client::PosClient;
use posflow_core::User;

pub fn login(client: &PosClient, token: &str, user_json: Option<&str>) -> Result<()> {
    let token = token.trim();
    anyhow::ensure!(!token.is_empty(), "token must not be empty");

    match user_json {
        Some(raw) => {
            let user: User = serde_json::from_str(raw).context("parsing --user")?;
            client.session().login(token, &user)?;
            println!("Signed in as {} ({})", display_name(&user), String::from(user.role.clone()));
        }
        None => {
            debug!("Storing token without a user record");
            client.tokens().set_token(token)?;
            println!("Token stored");
        }
    }
    Ok(())
}

pub fn logout(client: &PosClient) -> Result<()> {
    client.session().logout()?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(client: &PosClient) -> Result<()> {
    match client.session().current_user() {
        Some(user) => {
            println!("{}", display_name(&user));
            println!("  id:    {}", user.id);
            println!("  role:  {}", String::from(user.role.clone()));
            if let Some(email) = &user.email {
                println!("  email: {}", email);
            }
            if let Some(business) = user.business_type {
                println!("  business: {:?}", business);
            }
        }
        None if client.session().is_logged_in() => println!("Token stored, no user record"),
        None => println!("Not signed in"),
    }
    Ok(())
}

fn display_name(user: &User) -> &str {
    if user.name.is_empty() {
        &user.id
    } else {
        &user.name
    }
}
