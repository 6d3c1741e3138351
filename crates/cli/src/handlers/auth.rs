//! Handlers for the `auth` command group (Keycloak, Firebase)

use super::{prompt_or, prompt_password, unlock};
use crate::{FirebaseAction, KeycloakAction};
use anyhow::Result;
use flextk_core::{
    firebase_settings, keycloak_settings, FirebaseClient, FirebaseUser, KeycloakClient,
    KeycloakToken,
};
use tabled::{Table, Tabled};

fn print_token(token: &KeycloakToken) {
    println!("  Access token:  {}", token.access_token);
    if let Some(refresh) = &token.refresh_token {
        println!("  Refresh token: {}", refresh);
    }
    println!("  Type:          {}", token.token_type);
    println!("  Expires in:    {}s", token.expires_in);
    if let Some(expires_at) = token.expires_at {
        println!("  Expires at:    {}", expires_at.format("%Y-%m-%d %H:%M:%S"));
    }
}

pub async fn handle_keycloak(action: KeycloakAction, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = keycloak_settings(&config, &secrets)?;
    let client = KeycloakClient::new(&settings);

    match action {
        KeycloakAction::Login { username } => {
            let username = prompt_or(username.as_deref(), "Username")?;
            let user_password = prompt_password("Password")?;
            let token = client.login(&username, &user_password).await?;
            println!("  ✅ Logged in as {}", username);
            print_token(&token);
        }
        KeycloakAction::Refresh { refresh_token } => {
            let token = client.refresh(&refresh_token).await?;
            println!("  ✅ Token refreshed");
            print_token(&token);
        }
        KeycloakAction::Userinfo { access_token } => {
            let claims = client.userinfo(&access_token).await?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        KeycloakAction::Introspect { token } => {
            let result = client.introspect(&token).await?;
            println!(
                "  Active:    {}",
                if result.active { "yes" } else { "no" }
            );
            if let Some(username) = &result.username {
                println!("  Username:  {}", username);
            }
            if let Some(exp) = result.exp {
                println!("  Expires:   {}", exp);
            }
        }
        KeycloakAction::Logout { refresh_token } => {
            client.logout(&refresh_token).await?;
            println!("  ✅ Session terminated");
        }
        KeycloakAction::Roles {
            access_token,
            role,
            realm,
        } => {
            let has_role = client.has_role(&access_token, &role, realm)?;
            if has_role {
                println!("  ✅ Token has role '{}'", role);
            } else {
                println!("  ⚠️  Token does not have role '{}'", role);
            }
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Uid")]
    uid: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Verified")]
    verified: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
}

impl From<&FirebaseUser> for UserRow {
    fn from(user: &FirebaseUser) -> Self {
        Self {
            uid: user.local_id.clone(),
            email: user.email.clone().unwrap_or_else(|| "-".to_string()),
            name: user.display_name.clone().unwrap_or_else(|| "-".to_string()),
            verified: if user.email_verified { "yes" } else { "no" }.to_string(),
            disabled: if user.disabled { "yes" } else { "no" }.to_string(),
        }
    }
}

fn print_user(user: &FirebaseUser) {
    println!("  Uid:       {}", user.local_id);
    println!("  Email:     {}", user.email.as_deref().unwrap_or("-"));
    println!("  Phone:     {}", user.phone_number.as_deref().unwrap_or("-"));
    println!("  Name:      {}", user.display_name.as_deref().unwrap_or("-"));
    println!("  Verified:  {}", if user.email_verified { "yes" } else { "no" });
    println!("  Disabled:  {}", if user.disabled { "yes" } else { "no" });
}

pub async fn handle_firebase(action: FirebaseAction, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = firebase_settings(&config, &secrets)?;
    let client = FirebaseClient::new(&settings)?;

    match action {
        FirebaseAction::User { id, email, phone } => {
            let user = if let Some(id) = id {
                client.get_user_by_id(&id).await?
            } else if let Some(email) = email {
                client.get_user_by_email(&email).await?
            } else if let Some(phone) = phone {
                client.get_user_by_phone_number(&phone).await?
            } else {
                anyhow::bail!("Pass one of --id, --email or --phone");
            };
            print_user(&user);
        }
        FirebaseAction::Users {
            max_results,
            page_token,
        } => {
            let page = client
                .list_users(max_results, page_token.as_deref())
                .await?;
            if page.users.is_empty() {
                println!("No users found.");
            } else {
                let rows: Vec<UserRow> = page.users.iter().map(UserRow::from).collect();
                println!("{}", Table::new(rows));
            }
            if let Some(next) = page.next_page_token {
                println!();
                println!("  Next page: --page-token {}", next);
            }
        }
    }

    Ok(())
}
