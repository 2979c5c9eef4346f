use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use room_ai::settings::api_key_from_env;
use room_ai::{
    CredentialStore, GeminiClient, KeyringCredentialStore, NormalizerConfig, RoomDesigner,
    Settings, build_request, demo_prompts, interpret_completion, load_settings, validate_api_key,
};
use room_core::SceneObject;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type DynError = Box<dyn Error>;
type Flags = HashMap<String, String>;

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    match args[0].as_str() {
        "place" => run_place(&args[1..]),
        "normalize" => run_normalize(&args[1..]),
        "system-prompt" => run_system_prompt(&args[1..]),
        "set-key" => run_set_key(&args[1..]),
        "clear-key" => run_clear_key(),
        "demo-prompts" => {
            for prompt in demo_prompts() {
                println!("{prompt}");
            }
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn run_place(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let prompt = required_str(&flags, "--prompt")?;
    let settings = settings_from_flags(&flags)?;
    let credentials = KeyringCredentialStore::new();

    let api_key = match (flags.get("--api-key"), api_key_from_env()) {
        (Some(key), _) => Some(key.clone()),
        (None, Some(key)) => Some(key),
        (None, None) => credentials.load()?,
    };

    let client = GeminiClient::new(settings.generation.clone());
    let mut designer = RoomDesigner::init(client, settings, api_key);
    match designer.submit_prompt(prompt) {
        Ok(object) => {
            info!(id = %object.id, kind = %object.kind, "placed object");
            println!("{}", serde_json::to_string_pretty(&object)?);
            Ok(())
        }
        Err(err) if err.is_auth_expiry() => {
            if let Err(clear_err) = credentials.clear() {
                warn!("failed to clear stored API key: {clear_err}");
            }
            Err(format!("{err}; the stored API key was cleared, set a new one with set-key").into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_normalize(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let path = required_str(&flags, "--file")?;
    let settings = settings_from_flags(&flags)?;

    let object = normalize_file(path, &settings.normalizer)?;
    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(())
}

fn run_system_prompt(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let existing = match flags.get("--existing") {
        Some(path) => read_existing(path)?,
        None => Vec::new(),
    };
    let prompt = optional_str(&flags, "--prompt", "<prompt>");
    println!("{}", render_request(prompt, &existing));
    Ok(())
}

fn run_set_key(args: &[String]) -> Result<(), DynError> {
    let flags = parse_flags(args)?;
    let key = validate_api_key(Some(required_str(&flags, "--api-key")?))?;
    KeyringCredentialStore::new().save(key)?;
    eprintln!("API key saved");
    Ok(())
}

fn run_clear_key() -> Result<(), DynError> {
    KeyringCredentialStore::new().clear()?;
    eprintln!("API key cleared");
    Ok(())
}

fn settings_from_flags(flags: &Flags) -> Result<Settings, DynError> {
    let path = flags.get("--config").map(Path::new);
    Ok(load_settings(path)?)
}

fn normalize_file(path: impl AsRef<Path>, config: &NormalizerConfig) -> Result<SceneObject, DynError> {
    let raw = fs::read_to_string(path)?;
    Ok(interpret_completion(&raw, config)?)
}

fn read_existing(path: impl AsRef<Path>) -> Result<Vec<SceneObject>, DynError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn render_request(prompt: &str, existing: &[SceneObject]) -> String {
    let request = build_request(prompt, existing);
    format!("{}\n\n---\n\n{}", request.system_text, request.user_text)
}

fn parse_flags(args: &[String]) -> Result<Flags, DynError> {
    if !args.len().is_multiple_of(2) {
        return Err("expected flag-value pairs".into());
    }

    let mut flags = HashMap::new();
    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        if !flag.starts_with("--") {
            return Err(format!("expected flag at position {}", index + 1).into());
        }
        let value = args[index + 1].clone();
        if flags.insert(flag.to_string(), value).is_some() {
            return Err(format!("duplicate flag: {flag}").into());
        }
        index += 2;
    }
    Ok(flags)
}

fn required_str<'a>(flags: &'a Flags, key: &str) -> Result<&'a str, DynError> {
    flags
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("missing required {key}").into())
}

fn optional_str<'a>(flags: &'a Flags, key: &str, default: &'a str) -> &'a str {
    flags.get(key).map(String::as_str).unwrap_or(default)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  room-cli place --prompt <text> [--api-key <key>] [--config <path>]");
    eprintln!("  room-cli normalize --file <response.txt> [--config <path>]");
    eprintln!("  room-cli system-prompt [--existing <objects.json>] [--prompt <text>]");
    eprintln!("  room-cli set-key --api-key <key>");
    eprintln!("  room-cli clear-key");
    eprintln!("  room-cli demo-prompts");
}
