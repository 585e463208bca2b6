use lily_core::util::normalize_text_option;
use lily_core::AuthTokens;

use crate::auth::{clear_stored_tokens, load_stored_tokens, store_tokens, ACCESS_TOKEN_ENV};
use crate::cli::AuthCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);

    match command {
        AuthCommands::Login { token, id_token } => {
            let mut tokens = AuthTokens::from_access_token(token)?;
            tokens.id_token = normalize_text_option(id_token);
            store_tokens(&profile_name, &tokens)?;
            if config.profile(&profile_name).is_none() {
                println!(
                    "Profile '{profile_name}' has no saved config; defaults apply until `lily config init` is run."
                );
            }
            println!("Stored access token for profile '{profile_name}'");
        }
        AuthCommands::Status => {
            if normalize_text_option(std::env::var(ACCESS_TOKEN_ENV).ok()).is_some() {
                println!("Profile '{profile_name}' uses the token from {ACCESS_TOKEN_ENV}");
            } else if load_stored_tokens(&profile_name)?.is_some() {
                println!("Profile '{profile_name}' is signed in");
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
        }
        AuthCommands::Logout => {
            clear_stored_tokens(&profile_name)?;
            println!("Signed out profile '{profile_name}'");
        }
    }
    Ok(())
}
