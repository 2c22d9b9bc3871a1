use clap::Parser;
use gamine::config::cli::{parse_value, Command};
use gamine::utils::error::{ErrorSeverity, GamineError, Result};
use gamine::utils::logger;
use gamine::{ArrayModel, CliConfig, DataArray, Gamine, GamineConfig, Params, StorableObject};
use serde_json::{json, Value};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 載入 TOML 配置
    let config = match GamineConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let logging = if config.json_logging() {
        logger::init_json_logger()
    } else {
        logger::init_cli_logger(cli.verbose || config.verbose_logging())
    };
    if let Err(e) = logging {
        eprintln!("⚠️ Logger not initialized: {}", e);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let gamine = match Gamine::from_config(&config) {
        Ok(gamine) => gamine,
        Err(e) => exit_with(&e),
    };

    match run(&gamine, cli.command).await {
        Ok(output) => println!("{}", output),
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &GamineError) -> ! {
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn run(gamine: &Gamine, command: Command) -> Result<String> {
    let output = match command {
        Command::Managers => {
            let managers: Vec<_> = gamine.registry().managers().collect();
            serde_json::to_value(managers)?
        }
        Command::FindAll { manager, params } => {
            let manager = gamine.array_manager(&manager)?;
            let objects = manager.find_all(&to_params(params)).await?;
            Value::Array(objects.iter().map(as_json).collect())
        }
        Command::FindOne {
            manager,
            id,
            params,
        } => {
            let manager = gamine.array_manager(&manager)?;
            manager
                .find_one_by_id(parse_value(&id), &to_params(params))
                .await?
                .map(|object| as_json(&object))
                .unwrap_or(Value::Null)
        }
        Command::FindBy {
            manager,
            key,
            value,
            params,
        } => {
            let manager = gamine.array_manager(&manager)?;
            let objects = manager
                .find_by_key_val(&key, parse_value(&value), &to_params(params))
                .await?;
            Value::Array(objects.iter().map(as_json).collect())
        }
        Command::Save { manager, data } => {
            let manager = gamine.array_manager(&manager)?;
            let data: DataArray = serde_json::from_str(&data)?;

            let mut object = manager.instantiate();
            object.from_data_array(&data)?;
            let saved = manager.save(&mut object).await?;
            json!({ "saved": saved, "data": object.to_data_array() })
        }
        Command::Remove { manager, id } => {
            let manager = gamine.array_manager(&manager)?;

            let mut object = manager.instantiate();
            manager.set_identifier_value(&mut object, parse_value(&id))?;
            let removed = manager.remove(&mut object).await?;
            json!({ "removed": removed })
        }
        Command::Route { manager, route } => {
            let manager = gamine.array_manager(&manager)?;
            Value::String(manager.resource_route(&route)?.to_string())
        }
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

fn to_params(pairs: Vec<(String, String)>) -> Params {
    pairs.into_iter().collect()
}

fn as_json(object: &ArrayModel) -> Value {
    Value::Object(object.to_data_array())
}
