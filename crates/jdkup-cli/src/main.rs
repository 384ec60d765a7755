use std::{collections::BTreeMap, error::Error, fs, path::Path, path::PathBuf, time::Duration};

use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use jdkup_toolchain::{
    CatalogClient, PackageQuery, Platform, ProxyConfig, ReqwestTransport, Resolver,
    ResolverConfig, ToolchainRegistry, ToolchainRequirement, DEFAULT_VENDOR,
};
use serde::Deserialize;
use tracing::info;

const TELEMETRY_FLUSH: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "jdkup", version, about = "Resolve and provision Maven JDK toolchains")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Maven toolchains registry [default: ~/.m2/toolchains.xml]
    #[arg(long, global = true, env = "JDKUP_TOOLCHAINS_FILE")]
    toolchains_file: Option<String>,
    /// Where downloaded JDKs are unpacked [default: ~/.m2/jdks]
    #[arg(long, global = true, env = "JDKUP_JDKS_DIR")]
    jdks_dir: Option<String>,
    /// jbang installation [default: $JBANG_DIR or ~/.jbang]
    #[arg(long, global = true, env = "JDKUP_JBANG_HOME")]
    jbang_home: Option<String>,
    /// Never install JDKs through jbang
    #[arg(long, global = true, env = "JDKUP_NO_JBANG", value_parser = FalseyValueParser::new())]
    no_jbang: bool,
    /// foojay packages endpoint
    #[arg(long, global = true, env = "JDKUP_CATALOG_URL")]
    catalog_url: Option<String>,
    /// Maven settings used for proxy lookup [default: ~/.m2/settings.xml]
    #[arg(long, global = true, env = "JDKUP_SETTINGS_FILE")]
    settings_file: Option<String>,
    /// HTTP(S) proxy, `host:port` or `scheme://host:port`
    #[arg(long, global = true, env = "JDKUP_PROXY")]
    proxy: Option<String>,
    #[arg(long, global = true, env = "JDKUP_PROXY_USER")]
    proxy_user: Option<String>,
    #[arg(long, global = true, env = "JDKUP_PROXY_PASSWORD", hide_env_values = true)]
    proxy_password: Option<String>,
    #[arg(short, long, global = true, env = "JDKUP_VERBOSE", value_parser = FalseyValueParser::new())]
    verbose: bool,
}

#[derive(Subcommand)]
enum Cmd {
    /// Match the required toolchains, installing missing JDKs
    Resolve {
        /// `type` or `type:key=value,...`, e.g. `jdk:version=17,vendor=temurin`
        #[arg(long = "require", value_name = "REQUIREMENT")]
        require: Vec<ToolchainRequirement>,
        /// JSON file with more requirements
        #[arg(long)]
        requirements: Option<PathBuf>,
        /// Write the selected toolchains as JSON
        #[arg(long)]
        emit_context: Option<PathBuf>,
        #[arg(long, env = "JDKUP_SKIP", value_parser = FalseyValueParser::new())]
        skip: bool,
    },
    /// List toolchains in the registry
    List {
        #[arg(long = "type")]
        toolchain_type: Option<String>,
    },
    /// Look up a JDK package in the catalog without installing it
    Find {
        #[arg(long)]
        version: String,
        #[arg(long, default_value = DEFAULT_VENDOR)]
        vendor: String,
    },
}

impl Cmd {
    fn name(&self) -> &'static str {
        match self {
            Cmd::Resolve { .. } => "resolve",
            Cmd::List { .. } => "list",
            Cmd::Find { .. } => "find",
        }
    }
}

/// Either `[{"type": "jdk", "params": {...}}]` or `{"jdk": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementsFile {
    List(Vec<ToolchainRequirement>),
    ByType(BTreeMap<String, BTreeMap<String, String>>),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        jdkup_telemetry::flush(TELEMETRY_FLUSH);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    jdkup_util::init_tracing(cli.global.verbose)?;
    jdkup_util::init_cli_telemetry("jdkup", env!("CARGO_PKG_VERSION"), cli.cmd.name());

    match cli.cmd {
        Cmd::Resolve {
            require,
            requirements,
            emit_context,
            skip,
        } => {
            let mut all = require;
            if let Some(file) = requirements {
                all.extend(load_requirements(&file)?);
            }
            let config = build_config(&cli.global, skip);
            let transport = ReqwestTransport::new(config.effective_proxy().as_ref())?;
            let context = Resolver::new(config, &transport).resolve(&all)?;
            for (toolchain_type, toolchain) in context.iter() {
                info!(
                    "Using {} toolchain from {} ({})",
                    toolchain_type,
                    toolchain
                        .jdk_home
                        .as_deref()
                        .map(|home| home.display().to_string())
                        .unwrap_or_else(|| "-".into()),
                    toolchain.origin.as_str()
                );
            }
            if let Some(path) = emit_context {
                jdkup_util::write_json_atomic(&path, &context)
                    .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            }
        }
        Cmd::List { toolchain_type } => {
            let config = build_config(&cli.global, false);
            let registry = ToolchainRegistry::new(config.toolchains_file);
            for toolchain in registry.all_toolchains()? {
                if toolchain_type
                    .as_deref()
                    .is_some_and(|wanted| wanted != toolchain.toolchain_type)
                {
                    continue;
                }
                let provides: Vec<_> = toolchain
                    .provides
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                println!(
                    "{}\t{}\t{}",
                    toolchain.toolchain_type,
                    provides.join(","),
                    toolchain.jdk_home().unwrap_or("-")
                );
            }
        }
        Cmd::Find { version, vendor } => {
            let config = build_config(&cli.global, false);
            let transport = ReqwestTransport::new(config.effective_proxy().as_ref())?;
            let query = PackageQuery::new(version, vendor, Platform::detect());
            let found = CatalogClient::new(&transport, config.catalog_url.clone())
                .find_package(&query)?
                .ok_or_else(|| {
                    format!(
                        "no {} {} package for {} in the catalog",
                        query.vendor, query.version, query.platform
                    )
                })?;
            println!("{}\t{}", found.file_name, found.download_url);
            if let Some(sha256) = found.sha256 {
                println!("sha256\t{sha256}");
            }
        }
    }

    jdkup_telemetry::flush(TELEMETRY_FLUSH);
    Ok(())
}

fn build_config(args: &GlobalArgs, skip: bool) -> ResolverConfig {
    let mut config = ResolverConfig::default();
    if let Some(path) = &args.toolchains_file {
        config.toolchains_file = jdkup_util::expand_user(path);
    }
    if let Some(path) = &args.jdks_dir {
        config.jdks_dir = jdkup_util::expand_user(path);
    }
    if let Some(path) = &args.settings_file {
        config.settings_file = jdkup_util::expand_user(path);
    }
    if args.no_jbang {
        config.jbang_home = None;
    } else if let Some(path) = &args.jbang_home {
        config.jbang_home = Some(jdkup_util::expand_user(path));
    }
    if let Some(url) = args
        .catalog_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        config.catalog_url = url.to_string();
    }
    config.proxy = args.proxy.as_deref().map(|url| {
        ProxyConfig::new(url).with_credentials(args.proxy_user.clone(), args.proxy_password.clone())
    });
    config.skip = skip;
    config
}

fn load_requirements(path: &Path) -> Result<Vec<ToolchainRequirement>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let parsed: RequirementsFile = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid requirements file {}: {e}", path.display()))?;
    Ok(match parsed {
        RequirementsFile::List(list) => list,
        RequirementsFile::ByType(by_type) => by_type
            .into_iter()
            .map(|(toolchain_type, params)| ToolchainRequirement {
                toolchain_type,
                params,
            })
            .collect(),
    })
}
