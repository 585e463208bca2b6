use lily_core::util::normalize_text_option;
use lily_core::ClientConfig;

use crate::cli::ConfigCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

/// Values passed to `lily config init`; unset fields keep the stored value
#[derive(Debug, Default)]
pub struct ConfigInitOptions {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub sync_interval_secs: Option<u64>,
    pub reminder_interval_secs: Option<u64>,
    pub no_activate: bool,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_url,
            timeout_secs,
            sync_interval_secs,
            reminder_interval_secs,
            no_activate,
        } => run_config_init(
            global_profile,
            ConfigInitOptions {
                api_url,
                timeout_secs,
                sync_interval_secs,
                reminder_interval_secs,
                no_activate,
            },
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    options: ConfigInitOptions,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let no_activate = options.no_activate;
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();
    *config.profile_mut_or_default(&profile_name) = merge_profile(existing, options)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    println!("Run `lily auth login --token <token>` to sign in.");
    Ok(())
}

/// Apply explicit init values on top of a stored profile and validate the result
pub fn merge_profile(
    mut profile: ClientConfig,
    options: ConfigInitOptions,
) -> Result<ClientConfig, CliError> {
    if let Some(url) = normalize_text_option(options.api_url) {
        profile.api_base_url = url;
    }
    if let Some(secs) = options.timeout_secs {
        profile.request_timeout_secs = secs;
    }
    if let Some(secs) = options.sync_interval_secs {
        profile.sync_interval_secs = secs;
    }
    if let Some(secs) = options.reminder_interval_secs {
        profile.reminder_interval_secs = secs;
    }
    profile.validate()?;
    Ok(profile)
}

pub fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    if config.profile(&profile_name).is_none() {
        eprintln!("Profile '{profile_name}' is not configured; showing defaults.");
    }

    let effective = config.client_config(&profile_name)?;
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}
